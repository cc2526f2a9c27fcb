//! Monitor event loop: owns the displayed state and dispatches every event.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::types::AppConfig;
use crate::daemon::events::{ActionKind, AppEvent, RefreshOrigin, TimerId};
use crate::daemon::gateway::OperationGateway;
use crate::daemon::presenter::{NotifyLevel, Presenter};
use crate::hardware::types::DriveState;
use crate::power::sequencer::PowerSequencer;
use crate::power::types::{OperationKind, SleepOptions};

pub struct Controller {
    gateway: OperationGateway,
    presenter: Arc<dyn Presenter>,
    events: UnboundedSender<AppEvent>,
    state: DriveState,
    periodic_interval: Duration,
    post_operation_delay: Duration,
}

impl Controller {
    pub fn new(
        sequencer: Arc<PowerSequencer>,
        presenter: Arc<dyn Presenter>,
        config: &AppConfig,
    ) -> (Self, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sleep_options = SleepOptions { take_offline: config.drive.offline_on_sleep };

        let controller = Self {
            gateway: OperationGateway::new(sequencer, tx.clone(), sleep_options),
            presenter,
            events: tx,
            state: DriveState::Unknown,
            periodic_interval: Duration::from_secs(config.timing.periodic_check_minutes.max(1) * 60),
            post_operation_delay: Duration::from_secs(config.timing.post_operation_check_seconds.max(1)),
        };
        (controller, rx)
    }

    pub fn sender(&self) -> UnboundedSender<AppEvent> {
        self.events.clone()
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    pub fn gateway(&self) -> &OperationGateway {
        &self.gateway
    }

    fn set_state(&mut self, state: DriveState) {
        if self.state != state {
            self.state = state;
            self.presenter.render(state);
        }
    }

    fn start_operation(&mut self, kind: OperationKind) {
        let eligible = match kind {
            OperationKind::Wake => self.state.can_wake(),
            OperationKind::Sleep => self.state.can_sleep(),
        };
        if !eligible {
            info!("{} is not available while the drive is {}", kind, self.state);
            return;
        }

        let started = match kind {
            OperationKind::Wake => self.gateway.trigger_wake(),
            OperationKind::Sleep => self.gateway.trigger_sleep(),
        };
        if started {
            self.set_state(DriveState::Transitioning);
            self.presenter.notify(kind.start_message(), NotifyLevel::Info);
        }
    }

    fn schedule(&self, timer: TimerId, delay: Duration) {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(AppEvent::TimerFired(timer));
        });
    }

    /// Apply one event. Breaks when the monitor should exit.
    pub fn handle_event(&mut self, event: AppEvent) -> ControlFlow<()> {
        match event {
            AppEvent::UserAction(ActionKind::Wake) => self.start_operation(OperationKind::Wake),
            AppEvent::UserAction(ActionKind::Sleep) => self.start_operation(OperationKind::Sleep),
            AppEvent::UserAction(ActionKind::Toggle) => {
                let kind = if self.state.can_sleep() { OperationKind::Sleep } else { OperationKind::Wake };
                self.start_operation(kind);
            }
            AppEvent::UserAction(ActionKind::Refresh) => self.gateway.refresh_status(RefreshOrigin::Manual),
            AppEvent::UserAction(ActionKind::Exit) => {
                info!("Exit requested");
                return ControlFlow::Break(());
            }
            AppEvent::OperationCompleted(result) => {
                debug!("{} finished: {}", result.kind, result.message);
                let level = if result.succeeded { NotifyLevel::Info } else { NotifyLevel::Error };
                self.presenter.notify(result.kind.completion_message(result.succeeded), level);
                self.schedule(TimerId::PostOperationCheck, self.post_operation_delay);
            }
            AppEvent::TimerFired(TimerId::PostOperationCheck) => {
                self.gateway.refresh_status(RefreshOrigin::PostOperation);
            }
            AppEvent::TimerFired(TimerId::PeriodicCheck) => {
                self.gateway.periodic_check();
            }
            AppEvent::StatusRefreshed { drive, origin } => {
                if self.gateway.is_transitioning() {
                    debug!("Status from {:?} ignored: operation in flight", origin);
                    return ControlFlow::Continue(());
                }
                let state = drive.effective_state();
                self.set_state(state);
                if origin == RefreshOrigin::Manual {
                    self.presenter.notify(&state.status_line(), NotifyLevel::Info);
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Run until an exit action arrives.
    pub async fn run(mut self, mut events: UnboundedReceiver<AppEvent>) {
        self.presenter.render(self.state);
        self.gateway.refresh_status(RefreshOrigin::Startup);

        let mut ticker = tokio::time::interval_at(Instant::now() + self.periodic_interval, self.periodic_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
                _ = ticker.tick() => AppEvent::TimerFired(TimerId::PeriodicCheck),
            };

            if self.handle_event(event).is_break() {
                break;
            }
        }
        debug!("Monitor loop stopped");
    }
}

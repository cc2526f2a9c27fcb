//! Single-slot dispatch of power operations onto background tasks.
//!
//! At most one Wake or Sleep runs at a time. Triggers while an operation is in
//! flight are ignored. Completion is reported on the event channel, after which
//! the slot is released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::daemon::events::{AppEvent, RefreshOrigin};
use crate::error::ToggleError;
use crate::power::sequencer::PowerSequencer;
use crate::power::types::{OperationKind, OperationResult, SleepOptions};

/// Minimum spacing between two periodic status checks.
pub const PERIODIC_DEBOUNCE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default)]
pub struct OperationSlot {
    busy: Arc<AtomicBool>,
}

impl OperationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<SlotGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SlotGuard { busy: self.busy.clone() })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Holds the slot; releases it when dropped, including on panic unwind.
#[derive(Debug)]
pub struct SlotGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

pub struct OperationGateway {
    sequencer: Arc<PowerSequencer>,
    events: UnboundedSender<AppEvent>,
    slot: OperationSlot,
    sleep_options: SleepOptions,
    last_periodic: Mutex<Option<Instant>>,
}

impl OperationGateway {
    pub fn new(sequencer: Arc<PowerSequencer>, events: UnboundedSender<AppEvent>, sleep_options: SleepOptions) -> Self {
        Self {
            sequencer,
            events,
            slot: OperationSlot::new(),
            sleep_options,
            last_periodic: Mutex::new(None),
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.slot.is_busy()
    }

    /// Start a Wake in the background. Returns false if one is already in flight.
    pub fn trigger_wake(&self) -> bool {
        self.launch(OperationKind::Wake)
    }

    /// Start a Sleep in the background. Returns false if one is already in flight.
    pub fn trigger_sleep(&self) -> bool {
        self.launch(OperationKind::Sleep)
    }

    fn launch(&self, kind: OperationKind) -> bool {
        let Some(guard) = self.slot.try_acquire() else {
            debug!("Ignoring {} request: an operation is already in flight", kind);
            return false;
        };

        info!("Starting {} operation", kind);
        let sequencer = self.sequencer.clone();
        let events = self.events.clone();
        let options = self.sleep_options;

        tokio::spawn(async move {
            let worker = tokio::spawn(async move {
                match kind {
                    OperationKind::Wake => sequencer.run_wake().await,
                    OperationKind::Sleep => sequencer.run_sleep(options).await,
                }
            });

            let result = match worker.await {
                Ok(result) => result,
                Err(e) => {
                    error!("{} operation aborted: {}", kind, e);
                    let err = ToggleError::SequenceFailed(format!("{} operation aborted unexpectedly", kind));
                    OperationResult::failed(kind, &err, None)
                }
            };

            if events.send(AppEvent::OperationCompleted(result)).is_err() {
                debug!("Event loop closed, dropping {} result", kind);
            }
            drop(guard);
        });

        true
    }

    /// Detect the drive in the background and report it as a status event.
    pub fn refresh_status(&self, origin: RefreshOrigin) {
        let sequencer = self.sequencer.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let drive = sequencer.detect().await;
            let _ = events.send(AppEvent::StatusRefreshed { drive, origin });
        });
    }

    /// Timer-driven refresh. Skipped while an operation runs or if the last one
    /// was less than a minute ago.
    pub fn periodic_check(&self) -> bool {
        if self.slot.is_busy() {
            debug!("Periodic check skipped: operation in flight");
            return false;
        }

        let now = Instant::now();
        {
            let mut last = self.last_periodic.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = *last {
                if now.duration_since(previous) < PERIODIC_DEBOUNCE {
                    debug!("Periodic check skipped: last check {:?} ago", now.duration_since(previous));
                    return false;
                }
            }
            *last = Some(now);
        }

        self.refresh_status(RefreshOrigin::Periodic);
        true
    }
}

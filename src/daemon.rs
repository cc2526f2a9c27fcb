//! Background monitor: event loop, operation gateway, presentation and instance lock.

pub mod controller;
pub mod events;
pub mod gateway;
pub mod pid;
pub mod presenter;

pub use controller::Controller;
pub use events::{ActionKind, AppEvent, RefreshOrigin, TimerId};
pub use gateway::{OperationGateway, OperationSlot};
pub use presenter::{ConsolePresenter, NotifyLevel, Presenter};

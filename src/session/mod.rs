pub mod commands;
pub mod controller;
pub mod events;
pub mod state;
#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{CycleReport, RestoreReport, SessionController};
pub use events::{EventSink, SessionEvent};
pub use state::{SessionPhase, SessionState};

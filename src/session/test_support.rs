use std::sync::Mutex;

use super::{EventSink, SessionEvent};

/// Event sink that keeps everything it is handed.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSink {
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn degraded_failures(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, SessionEvent::StoreFailure { degraded: true, .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: SessionEvent) {
        self.events.lock().unwrap().push(event);
    }
}

use log::warn;

use crate::core::action::SessionEvent;

/// Receives everything a session reports, in order.
pub trait SessionObserver {
    fn notify(&mut self, event: SessionEvent);
}

impl SessionObserver for std::sync::mpsc::Sender<SessionEvent> {
    fn notify(&mut self, event: SessionEvent) {
        if self.send(event).is_err() {
            warn!("Session observer dropped; event discarded");
        }
    }
}

impl SessionObserver for tokio::sync::mpsc::UnboundedSender<SessionEvent> {
    fn notify(&mut self, event: SessionEvent) {
        if self.send(event).is_err() {
            warn!("Session observer dropped; event discarded");
        }
    }
}

impl SessionObserver for Vec<SessionEvent> {
    fn notify(&mut self, event: SessionEvent) {
        self.push(event);
    }
}

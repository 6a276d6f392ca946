//! Break notification seam.

use crate::policy::BreakEvent;

/// Receives break recommendations. Fire-and-forget: the pipeline neither
/// waits for nor expects an acknowledgment.
pub trait BreakNotifier {
    fn notify(&mut self, event: &BreakEvent);
}

/// Logs break events at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl BreakNotifier for LogNotifier {
    fn notify(&mut self, event: &BreakEvent) {
        log::info!("[{}] {} (break #{})", event.title, event.message, event.break_index);
    }
}

impl<F> BreakNotifier for F
where
    F: FnMut(&BreakEvent),
{
    fn notify(&mut self, event: &BreakEvent) {
        self(event)
    }
}

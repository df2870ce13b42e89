use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Cancels an in-flight round
///
/// Clones share the same flag. Tasks spawned by a round check the flag before and during their
/// work. All of them are joined before the round returns
/// [`Cancelled`](crate::ProtocolError::Cancelled).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Constructs a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst)
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn check(&self) -> Result<(), super::TaskError> {
        if self.is_cancelled() {
            Err(super::TaskError::Cancelled)
        } else {
            Ok(())
        }
    }
}

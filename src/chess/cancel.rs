use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::error::PgnError;

/// Shared cancellation flag checked by the reader before every line and by the
/// writer before every record.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), PgnError> {
        if self.is_cancelled() {
            Err(PgnError::Cancelled)
        } else {
            Ok(())
        }
    }
}

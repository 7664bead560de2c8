//! Cooperative cancellation
//!
//! The pipeline polls the token between components; a cancelled run aborts
//! with `ZoningError::Cancelled` and returns no partial output.

use crate::error::{Result, ZoningError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag, cloneable across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Error out if cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ZoningError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lifecycle() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());

        let clone = token.clone();
        clone.cancel();

        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(ZoningError::Cancelled)));
    }
}

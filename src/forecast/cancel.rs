//! Cooperative cancellation for long forecast loops.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::AppError;

/// Shared flag checked by the forecast loop after every completed step.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A loop stopped by its `CancelFlag`; `completed` holds the steps finished
/// before the stop, unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Interrupted {
    pub completed: Vec<f64>,
    pub horizon: usize,
}

impl From<Interrupted> for AppError {
    fn from(value: Interrupted) -> Self {
        AppError::new(
            5,
            format!(
                "Forecast cancelled after {} of {} steps.",
                value.completed.len(),
                value.horizon
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = CancelFlag::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn interrupted_maps_to_exit_code_five() {
        let err: AppError = Interrupted { completed: vec![1.0], horizon: 3 }.into();
        assert_eq!(err.exit_code(), 5);
        assert!(err.message().contains("1 of 3"));
    }
}

//! Activation port - このインスタンスが処理してよいか
//!
//! Driven externally by cluster membership / discovery. The processor checks
//! it once per tick and does nothing (not even a queue poll) while inactive.

use std::sync::atomic::{AtomicBool, Ordering};

pub trait Activation: Send + Sync {
    fn is_active(&self) -> bool;
}

/// Flag flipped by a discovery listener.
#[derive(Debug, Default)]
pub struct ActivationFlag {
    enabled: AtomicBool,
}

impl ActivationFlag {
    /// Starts disabled, like an instance that has not joined discovery yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }
}

impl Activation for ActivationFlag {
    fn is_active(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

//! Generation-counter cancellation for superseded detections.
//!
//! A live feed can produce frames faster than detection completes. Each new
//! request calls [`DetectionSession::begin`], which bumps the generation and
//! makes every older [`Ticket`] stale. The pipeline checks its ticket between
//! stages and stops with [`NutriScanError::Cancelled`] once it is stale;
//! callers use [`Ticket::is_current`] to drop results that finished late.

use crate::util::{NutriScanError, NutriScanResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of detection tickets; cheap to clone and share across threads.
#[derive(Clone, Debug, Default)]
pub struct DetectionSession {
    generation: Arc<AtomicU64>,
}

impl DetectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, superseding all earlier tickets.
    pub fn begin(&self) -> Ticket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        Ticket {
            generation,
            current: Arc::clone(&self.generation),
        }
    }

    /// Invalidates every outstanding ticket without starting a new request.
    pub fn cancel_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Current generation number.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// Handle for one detection request.
#[derive(Clone, Debug)]
pub struct Ticket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl Ticket {
    /// Generation this ticket was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while no newer request has started.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }

    /// Fails with [`NutriScanError::Cancelled`] once superseded.
    pub fn ensure_current(&self) -> NutriScanResult<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(NutriScanError::Cancelled)
        }
    }
}

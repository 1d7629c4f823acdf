//! Progress reporting for batched mutations.

use std::io::Write;

use crate::fs::MutationOutcome;

/// Running tally of mutation outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationProgress {
    /// Items that succeeded
    pub succeeded: usize,
    /// Items that failed
    pub failed: usize,
}

impl MutationProgress {
    /// Record one outcome.
    pub fn record(&mut self, outcome: &MutationOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Total number of items seen.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Type alias for per-item outcome callback.
///
/// Invoked once for every mutation, right after the batch holding it returns.
pub type OutcomeCallback = Box<dyn FnMut(&MutationOutcome) + Send>;

/// Create a callback that prints `[✓]` per success and the error per failure.
///
/// # Example
/// ```no_run
/// use drivetools::progress::make_progress_printer;
///
/// let callback = make_progress_printer();
/// ```
pub fn make_progress_printer() -> OutcomeCallback {
    Box::new(|outcome: &MutationOutcome| {
        match &outcome.result {
            Ok(_) => print!("[✓]"),
            Err(e) => println!("\n{}: {}", outcome.mutation.target(), e),
        }
        let _ = std::io::stdout().flush();
    })
}

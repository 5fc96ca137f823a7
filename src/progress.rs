//! Progress-callback trait for per-step pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::service::ComplianceService::with_progress`] to receive events as
//! a multi-step operation moves through parse, extract, generate and grade.
//! The CLI forwards them to a terminal spinner; the HTTP server leaves the
//! callback unset.
//!
//! # Example
//!
//! ```rust
//! use compliance_master::{PipelineProgressCallback, PipelineStep};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_step_complete(&self, step: PipelineStep) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{step} done");
//!     }
//! }
//!
//! let cb: Arc<dyn PipelineProgressCallback> = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//! cb.on_step_complete(PipelineStep::Parse);
//! ```

use std::fmt;
use std::sync::Arc;

/// A stage of the compliance pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStep {
    Parse,
    Extract,
    Generate,
    Grade,
}

impl PipelineStep {
    pub fn label(self) -> &'static str {
        match self {
            PipelineStep::Parse => "Parsing document",
            PipelineStep::Extract => "Extracting fields",
            PipelineStep::Generate => "Generating template",
            PipelineStep::Grade => "Checking quality",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the service as each step of a multi-step operation runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Requests may run concurrently, so implementations
/// must be `Send + Sync` and synchronise their own state.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once before the first step, with the number of steps planned.
    fn on_pipeline_start(&self, total_steps: usize) {
        let _ = total_steps;
    }

    /// Called just before a step begins.
    fn on_step_start(&self, step: PipelineStep) {
        let _ = step;
    }

    /// Called when a step finishes successfully.
    fn on_step_complete(&self, step: PipelineStep) {
        let _ = step;
    }

    /// Called when a step fails; the operation stops afterwards.
    fn on_step_error(&self, step: PipelineStep, error: &str) {
        let _ = (step, error);
    }

    /// Called once after the last step succeeded.
    fn on_pipeline_complete(&self) {}
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias for the type stored by the service.
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl PipelineProgressCallback for Recorder {
        fn on_pipeline_start(&self, total_steps: usize) {
            self.events.lock().unwrap().push(format!("start {total_steps}"));
        }

        fn on_step_complete(&self, step: PipelineStep) {
            self.events.lock().unwrap().push(format!("done {step:?}"));
        }

        fn on_step_error(&self, step: PipelineStep, error: &str) {
            self.events.lock().unwrap().push(format!("error {step:?}: {error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_pipeline_start(4);
        cb.on_step_start(PipelineStep::Parse);
        cb.on_step_complete(PipelineStep::Parse);
        cb.on_step_error(PipelineStep::Extract, "boom");
        cb.on_pipeline_complete();
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Recorder::default();
        rec.on_pipeline_start(3);
        rec.on_step_start(PipelineStep::Parse);
        rec.on_step_complete(PipelineStep::Parse);
        rec.on_step_error(PipelineStep::Extract, "LLM API error: quota");
        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["start 3", "done Parse", "error Extract: LLM API error: quota"]
        );
    }

    #[test]
    fn step_labels() {
        assert_eq!(PipelineStep::Grade.to_string(), "Checking quality");
    }
}

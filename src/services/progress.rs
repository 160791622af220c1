//! Progress reporting service
//!
//! The pipeline reports stages through [`ProgressReporter`]; frontends decide
//! how to render them (log lines, progress bars, nothing at all).

use crate::types::ProcessingTimings;
use instant::Instant;

/// Stages of the per-photo pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Decoding input bytes
    ImageLoading,
    /// Max-width downscale
    Resizing,
    /// Calling the matting backend
    Matting,
    /// Resolving or synthesizing the backdrop
    BackdropSynthesis,
    /// Blending the cutout over the backdrop
    Compositing,
    /// Encoding the output image
    Encoding,
    /// Processing completed
    Completed,
}

impl ProcessingStage {
    /// Get a human-readable description of the processing stage
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::ImageLoading => "Loading input image",
            Self::Resizing => "Resizing photo",
            Self::Matting => "Removing background",
            Self::BackdropSynthesis => "Preparing backdrop",
            Self::Compositing => "Compositing",
            Self::Encoding => "Encoding output",
            Self::Completed => "Processing completed",
        }
    }

    /// Get the typical progress percentage for this stage
    #[must_use]
    pub fn progress_percentage(self) -> u8 {
        match self {
            Self::ImageLoading => 5,
            Self::Resizing => 10,
            Self::Matting => 60,
            Self::BackdropSynthesis => 75,
            Self::Compositing => 85,
            Self::Encoding => 95,
            Self::Completed => 100,
        }
    }
}

/// Progress update for a single photo
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Submission index of the photo
    pub index: usize,
    /// Current processing stage
    pub stage: ProcessingStage,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Elapsed time since processing of this photo started (milliseconds)
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    #[must_use]
    pub fn new(index: usize, stage: ProcessingStage, start_time: Instant) -> Self {
        Self {
            index,
            progress: stage.progress_percentage(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
        }
    }
}

/// Running totals for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Items finished so far, successful or not
    pub completed: usize,
    /// Items that failed
    pub failed: usize,
    /// Items in the batch
    pub total: usize,
}

/// Trait for reporting progress during processing
pub trait ProgressReporter: Send + Sync {
    /// Report a stage transition for one photo
    fn report_progress(&self, update: ProgressUpdate);

    /// Report a finished photo with its timings
    fn report_completion(&self, index: usize, timings: &ProcessingTimings);

    /// Report a failed photo
    fn report_error(&self, index: usize, stage: Option<ProcessingStage>, error: &str);

    /// Report batch level progress after each finished item
    fn report_batch_progress(&self, progress: BatchProgress) {
        let _ = progress;
    }
}

/// No-op progress reporter that discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {}

    fn report_completion(&self, _index: usize, _timings: &ProcessingTimings) {}

    fn report_error(&self, _index: usize, _stage: Option<ProcessingStage>, _error: &str) {}
}

/// Console progress reporter that logs progress through `log`
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter
    ///
    /// Stage transitions are only logged when `verbose` is set.
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            log::info!(
                "[#{} {}%] {} ({}ms elapsed)",
                update.index,
                update.progress,
                update.stage.description(),
                update.elapsed_ms
            );
        }
    }

    fn report_completion(&self, index: usize, timings: &ProcessingTimings) {
        log::info!("✅ Item #{} completed in {}ms", index, timings.total_ms);

        if self.verbose {
            log::info!("  📊 Detailed timings:");
            log::info!("    • Decode: {}ms", timings.decode_ms);
            log::info!("    • Resize: {}ms", timings.resize_ms);
            log::info!("    • Matting: {}ms", timings.matting_ms);
            log::info!("    • Backdrop: {}ms", timings.backdrop_ms);
            log::info!("    • Composite: {}ms", timings.composite_ms);
            log::info!("    • Encode: {}ms", timings.encode_ms);
        }
    }

    fn report_error(&self, index: usize, stage: Option<ProcessingStage>, error: &str) {
        match stage {
            Some(stage) => log::error!("❌ Item #{} failed during {}: {}", index, stage.description(), error),
            None => log::error!("❌ Item #{} failed: {}", index, error),
        }
    }

    fn report_batch_progress(&self, progress: BatchProgress) {
        if self.verbose {
            log::info!(
                "Batch progress: {}/{} ({} failed)",
                progress.completed,
                progress.total,
                progress.failed
            );
        }
    }
}

/// Per-photo stage tracker wrapping a reporter
pub struct ProgressTracker<'a> {
    reporter: &'a dyn ProgressReporter,
    index: usize,
    start_time: Instant,
    current_stage: Option<ProcessingStage>,
}

impl<'a> ProgressTracker<'a> {
    #[must_use]
    pub fn new(reporter: &'a dyn ProgressReporter, index: usize) -> Self {
        Self {
            reporter,
            index,
            start_time: Instant::now(),
            current_stage: None,
        }
    }

    /// Report progress for a specific stage
    pub fn report_stage(&mut self, stage: ProcessingStage) {
        self.current_stage = Some(stage);
        self.reporter
            .report_progress(ProgressUpdate::new(self.index, stage, self.start_time));
    }

    /// Report completion with final timings
    pub fn report_completion(&mut self, timings: &ProcessingTimings) {
        self.report_stage(ProcessingStage::Completed);
        self.reporter.report_completion(self.index, timings);
    }

    /// Report an error at the current stage
    pub fn report_error(&self, error: &str) {
        self.reporter.report_error(self.index, self.current_stage, error);
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    #[must_use]
    pub fn current_stage(&self) -> Option<ProcessingStage> {
        self.current_stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        stages: Mutex<Vec<ProcessingStage>>,
        completions: Mutex<Vec<usize>>,
        errors: Mutex<Vec<(usize, Option<ProcessingStage>, String)>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn report_progress(&self, update: ProgressUpdate) {
            self.stages.lock().unwrap().push(update.stage);
        }

        fn report_completion(&self, index: usize, _timings: &ProcessingTimings) {
            self.completions.lock().unwrap().push(index);
        }

        fn report_error(&self, index: usize, stage: Option<ProcessingStage>, error: &str) {
            self.errors.lock().unwrap().push((index, stage, error.to_string()));
        }
    }

    #[test]
    fn test_stage_percentages_increase() {
        let order = [
            ProcessingStage::ImageLoading,
            ProcessingStage::Resizing,
            ProcessingStage::Matting,
            ProcessingStage::BackdropSynthesis,
            ProcessingStage::Compositing,
            ProcessingStage::Encoding,
            ProcessingStage::Completed,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].progress_percentage() < pair[1].progress_percentage());
        }
    }

    #[test]
    fn test_tracker_records_stages_and_errors() {
        let reporter = RecordingReporter::default();
        let mut tracker = ProgressTracker::new(&reporter, 4);
        tracker.report_stage(ProcessingStage::ImageLoading);
        tracker.report_stage(ProcessingStage::Matting);
        tracker.report_error("backend exploded");

        assert_eq!(
            *reporter.stages.lock().unwrap(),
            vec![ProcessingStage::ImageLoading, ProcessingStage::Matting]
        );
        let errors = reporter.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, 4);
        assert_eq!(errors[0].1, Some(ProcessingStage::Matting));
    }

    #[test]
    fn test_tracker_completion() {
        let reporter = RecordingReporter::default();
        let mut tracker = ProgressTracker::new(&reporter, 2);
        tracker.report_completion(&ProcessingTimings::default());
        assert_eq!(tracker.current_stage(), Some(ProcessingStage::Completed));
        assert_eq!(*reporter.completions.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_builtin_reporters_accept_all_calls() {
        for reporter in [
            Box::new(NoOpProgressReporter) as Box<dyn ProgressReporter>,
            Box::new(ConsoleProgressReporter::new(true)),
        ] {
            let mut tracker = ProgressTracker::new(reporter.as_ref(), 0);
            tracker.report_stage(ProcessingStage::Encoding);
            tracker.report_completion(&ProcessingTimings::default());
            tracker.report_error("late failure");
            reporter.report_batch_progress(BatchProgress {
                completed: 1,
                failed: 0,
                total: 1,
            });
        }
    }
}

//! Service layer: encoding, file I/O, archiving and progress reporting

pub mod archive;
pub mod format;
pub mod io;
pub mod progress;

pub use archive::ArchiveService;
pub use format::OutputFormatHandler;
pub use io::ImageIOService;
pub use progress::{
    BatchProgress, ConsoleProgressReporter, NoOpProgressReporter, ProcessingStage,
    ProgressReporter, ProgressTracker, ProgressUpdate,
};

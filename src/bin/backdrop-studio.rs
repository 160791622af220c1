//! Backdrop Studio CLI Tool
//!
//! Batch background replacement and studio backdrop generation from the
//! command line.

#[cfg(feature = "cli")]
use backdrop_studio::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}

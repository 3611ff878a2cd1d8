pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod progress;
pub mod storage;

pub use config::AppConfig;
pub use engine::{CleanupEngine, CleanupResult, ScanResult};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};

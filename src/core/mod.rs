mod args;
mod error;
mod logger;
mod types;

pub use args::{CliArgs, Command, OutputFormat};
pub use error::BenchError;
pub use logger::setup_logging;
pub use types::{BackendKind, Operation};

use clap::{Parser, Subcommand, ValueEnum};
use log::kv::{ToValue, Value};

use crate::core::{BackendKind, Operation};

#[derive(Parser, Debug, PartialEq)]
#[command(version, about)]
pub struct CliArgs {
    /// TOML config file; environment variables prefixed with DOCBENCH_ override it.
    #[arg(short, long)]
    pub config: Option<String>,
    /// JSON-lines dataset, takes precedence over `dataset.path` from the config.
    #[arg(short, long)]
    pub dataset: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Time one operation against one backend.
    Run {
        operation: Operation,
        backend: BackendKind,
        count: usize,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Time one operation against both backends, one after the other.
    Compare {
        operation: Operation,
        count: usize,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Print the number of documents currently stored in a backend.
    Count { backend: BackendKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

impl ToValue for CliArgs {
    fn to_value(&self) -> Value<'_> {
        Value::from_debug(self)
    }
}

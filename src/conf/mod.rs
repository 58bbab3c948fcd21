mod backend;
mod config;
mod workload;

pub use backend::{CouchConfig, MongoConfig};
pub use self::config::{Config, DatasetConfig};
pub use workload::{FieldMatch, FindConfig, UpdateConfig, WorkloadConfig};

pub mod backends;
pub mod conf;
pub mod core;
pub mod dataset;
pub mod harness;

#[cfg(feature = "testutil")]
pub mod testutil;

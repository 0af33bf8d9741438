pub mod cache;
pub mod checker;
pub mod collector;
pub mod config;
pub mod model;
pub mod output;
pub mod parse;

pub use cache::Cache;
pub use collector::Collector;
pub use config::Config;
pub use model::{DependencyType, PackageRecord, ScanReport, Source, Vulnerability};

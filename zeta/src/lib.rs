pub mod browser_pool;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod export;
pub mod logger;
pub mod record;
pub mod render;
pub mod report;
pub mod runner;

pub use discovery::{ScanError, ScanOutcome, SubdomainSource};
pub use record::SubdomainRecord;
pub use report::{ReportNode, ReportTree};

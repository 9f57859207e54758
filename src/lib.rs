pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod flatten;
pub mod job;
pub mod output;
pub mod schema;
pub mod source;
pub mod storage;

pub use config::JobConfig;
pub use error::{JobError, Result};
pub use job::{AggregationJob, InvocationContext, handler};

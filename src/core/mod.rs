pub mod aggregator;
pub mod client;
pub mod etl;
pub mod flatten;
pub mod pipeline;
pub mod rate_limiter;
pub mod table;
pub mod worker_pool;

pub use crate::domain::model::{Record, TransformResult};
pub use crate::domain::ports::{ConfigProvider, ContactApi, Pipeline, Storage};
pub use crate::utils::error::Result;

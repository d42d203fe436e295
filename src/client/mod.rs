//! HTTP client for the Vikunja REST API.

mod api_client;
mod error;
mod fanout;
pub mod models;


pub use api_client::{BucketAssignment, VikunjaClient, api_url, install_crypto_provider};
pub use error::{ApiError, ApiResult};
pub use fanout::{AggregatedTask, Tagged};
pub use models::{Bucket, Label, Project, ProjectView, Task, User, ZERO_DATE};

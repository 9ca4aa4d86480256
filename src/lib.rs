pub mod config;
pub mod error;
#[cfg(feature = "landmarks-ort")]
pub mod model_download;
pub mod pipeline;
pub mod pose;
pub mod types;

pub use config::StreamConfig;
pub use error::StreamError;

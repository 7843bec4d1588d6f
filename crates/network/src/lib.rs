//! HTTP client for talking to remote content servers

mod client;
mod error;
mod retry;

pub use client::{Client, ClientConfig};
pub use reqwest::Url;
pub use error::{NetworkError, NetworkResult};
pub use retry::RetryPolicy;

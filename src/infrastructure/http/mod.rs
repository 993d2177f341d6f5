//! HTTP client shared by the provider adapters

mod client;

pub use client::{HttpClient, HttpClientTrait};

#[cfg(test)]
pub use client::mock::MockHttpClient;

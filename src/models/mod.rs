// Data models for the proxy surface

pub mod proxy;

pub use proxy::{ProxyQuery, ProxyRequest, UpstreamResponse};

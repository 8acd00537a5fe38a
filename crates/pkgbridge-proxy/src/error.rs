//! Proxy error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid instance URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Upstream returned {status} for {url}")]
    Status { url: String, status: u16 },
}

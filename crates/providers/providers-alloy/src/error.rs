use thiserror::Error;

/// An error building an [`AlloyNodeClient`](crate::AlloyNodeClient).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The proxy URL was rejected.
    #[error("invalid proxy: {0}")]
    Proxy(#[source] reqwest::Error),
    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

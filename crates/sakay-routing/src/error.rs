use thiserror::Error;

/// Internal failure modes of a route fetch.
///
/// None of these escape [`crate::RouteResolver::resolve`]: every variant
/// collapses into the straight-line fallback. The typed distinction keeps
/// the fetch path testable and the debug logs precise.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The routing service answered but declined to route (`code != "Ok"`).
    #[error("routing service returned code {code:?}")]
    ServiceCode { code: String },

    /// HTTP success but a body that does not match the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A well-formed response with no usable route geometry.
    #[error("routing response contained no route with at least two points")]
    EmptyRoute,

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

use serde_json::Value;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the BEA client.
///
/// Transport failures and envelope-shape failures are kept distinct so a
/// caller can tell "the request never produced a body worth reading" apart
/// from "the body arrived but did not contain the expected node".
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server answered with a non-success HTTP status. The body is not
    /// inspected in this case; retrying (or not) is the caller's decision.
    #[error("API request failed: HTTP {status} for url ({url})")]
    Transport {
        status: reqwest::StatusCode,
        url: String,
    },

    /// A key named by the envelope path was absent from the decoded
    /// response. `partial` is the structure reached before the miss.
    #[error("missing key `{key}` in API response")]
    Structure { key: String, partial: Value },

    /// The response body carried BEA's per-minute quota error. The service
    /// keeps answering with this until the offending minute expires, so
    /// waiting before the next call is the only useful reaction.
    #[error("BEA call quota exceeded: {0}")]
    RateLimited(String),

    /// Any other error node the service placed inside the envelope
    /// (unknown dataset, bad parameter name, invalid key, ...).
    #[error("BEA API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    /// Aggregation was cancelled via its [`CancelToken`](crate::CancelToken).
    #[error("metadata collection cancelled")]
    Cancelled,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

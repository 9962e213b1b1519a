use thiserror::Error;

/// Failure of a single external identifier lookup attempt.
///
/// Transient failures (see [`LookupError::is_transient`]) are retried
/// according to the resolver's [`RetryPolicy`](crate::lookup::RetryPolicy);
/// anything else ends the lookup at once. Either way the resolver degrades to
/// a pass-through resolution. "Not found" is not an error; lookups report it
/// as `Ok(None)`.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request to {service} failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("malformed response from {service}: {reason}")]
    Malformed {
        service: &'static str,
        reason: String,
    },

    #[error("invalid lookup URL: {0}")]
    Url(#[from] url::ParseError),
}

impl LookupError {
    /// Timeouts, connection failures, rate limiting and server errors may
    /// succeed on a later attempt. Client errors, bad URLs and undecodable
    /// bodies will not.
    pub fn is_transient(&self) -> bool {
        match self {
            LookupError::Request { source, .. } => source.is_timeout() || source.is_connect(),
            LookupError::Status { status, .. } => *status == 429 || *status >= 500,
            LookupError::Malformed { .. } | LookupError::Url(_) => false,
        }
    }
}

/// A record that cannot be coerced into the canonical schema.
#[derive(Debug, Error, PartialEq)]
pub enum HarmonizeError {
    #[error("record {index}: field '{field}' is not numeric: {value}")]
    NotNumeric {
        index: usize,
        field: &'static str,
        value: String,
    },

    #[error("record {index}: field '{field}' holds a structured value")]
    StructuredValue { index: usize, field: &'static str },
}

use crate::script::ScriptError;
use super::transport::TransportError;

/// Failures of the job client. Errors reported by the job service in a well-formed response are
/// not failures: they are returned as values.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The script cannot be assembled (empty script, no interpreter).
    #[error(transparent)]
    Script(#[from] ScriptError),
    /// The request body cannot be serialized.
    #[error("unable to encode request: {0}")]
    Encode(serde_json::Error),
    /// The job identifier cannot name a single job in a URL path.
    #[error("invalid job identifier {0:?}")]
    InvalidJobId(String),
    /// No proxy credential has been loaded or generated yet.
    #[error("proxy not initialized")]
    ProxyNotInitialized,
    /// The job service cannot be reached.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The job service answered with a body that is not a known response shape.
    #[error("unexpected response (status {status}): {source}")]
    Decode {
        status: u16,
        source: serde_json::Error,
    },
}

use crate::entry::BatchEntry;

/// Destination for formatted batches produced by the shipper.
///
/// Implementations are responsible for transporting a batch to a concrete
/// backend (a Loki push endpoint over HTTP, or nothing at all for tests).
/// The shipper calls `push` inline from whatever thread emitted the log,
/// so implementations must bound how long a single push can take.
pub trait LokiTransport: Send + Sync {
    /// Deliver one batch.
    ///
    /// **Parameters**
    /// - `batch`: the entries accumulated since the previous flush, in
    ///   emission order.
    ///
    /// **Returns**
    /// - `Ok(())` if the backend accepted the batch.
    /// - `Err(..)` if delivery failed (network error, serialization
    ///   error, HTTP status). The shipper reports the failure to stderr
    ///   and drops the batch; it never retries.
    fn push(&self, batch: &[BatchEntry]) -> Result<(), ShipError>;
}

/// Failure modes of a single push attempt.
#[derive(thiserror::Error, Debug)]
pub enum ShipError {
    /// The backend answered with something other than 204 No Content.
    #[error("loki push rejected with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection refused, timeout, DNS failure and friends.
    #[cfg(feature = "http")]
    #[error("loki push transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("batch serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

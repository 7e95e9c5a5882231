use crate::entry::BatchEntry;
use crate::transport::{LokiTransport, ShipError};

/// A transport that simply drops all batches.
///
/// Useful for measuring the overhead of the layer itself without any
/// network I/O, and for tests that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopTransport;

impl LokiTransport for NoopTransport {
    fn push(&self, _batch: &[BatchEntry]) -> Result<(), ShipError> {
        Ok(())
    }
}

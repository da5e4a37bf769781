use crate::errors::LedgerResult;
use crate::stream::{RecordBatch, StreamRecord};

/// Callback receiving every batch a consumer reads.
pub type BatchHandler = Box<dyn Fn(RecordBatch) + Send + Sync>;

/// A stream consumer as provided by the stream client library.
///
/// Calling `stop_consumer` on a consumer that was never started must be safe.
pub trait StreamClient: Send + Sync {
    fn start_consumer(&self) -> LedgerResult<()>;

    fn stop_consumer(&self) -> LedgerResult<()>;

    /// Registers the handler that receives batches once the consumer runs.
    fn on_data(&self, handler: BatchHandler);
}

/// The producing side of a stream client.
pub trait StreamPublisher {
    /// Writes `records` to `stream_name` and returns the per-record results
    /// reported by the stream.
    fn put_records(
        &self,
        stream_name: &str,
        records: Vec<StreamRecord>,
    ) -> LedgerResult<Vec<serde_json::Value>>;
}

use crate::errors::LedgerResult;
use crate::stream::{RecordData, StreamPublisher, StreamRecord};

/// What each published record carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishSource {
    /// The input item itself, JSON encoded.
    InputData,
    /// A fixed message, sent once per input item.
    Message(String),
}

/// Builds one outgoing record per input item.
pub fn build_outgoing(
    items: &[serde_json::Value],
    source: &PublishSource,
) -> LedgerResult<Vec<StreamRecord>> {
    items
        .iter()
        .map(|item| -> LedgerResult<StreamRecord> {
            let text = match source {
                PublishSource::InputData => serde_json::to_string(item)?,
                PublishSource::Message(message) => message.clone(),
            };
            Ok(StreamRecord::new(RecordData::Text(text)))
        })
        .collect()
}

/// Publishes `items` to `stream_name` in one call.
///
/// Returns the per-record results, or a single `{"success": true}` when the
/// stream reports none.
pub fn publish<P: StreamPublisher + ?Sized>(
    publisher: &P,
    stream_name: &str,
    items: &[serde_json::Value],
    source: &PublishSource,
) -> LedgerResult<Vec<serde_json::Value>> {
    let records = build_outgoing(items, source)?;
    log::debug!("Publishing {} records to {}", records.len(), stream_name);
    let mut results = publisher.put_records(stream_name, records)?;
    if results.is_empty() {
        results.push(serde_json::json!({ "success": true }));
    }
    Ok(results)
}

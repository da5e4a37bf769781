use crate::errors::LedgerResult;
use crate::stream::ResponseShape;

/// Payload of a stream record at its different decoding stages.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordData {
    /// Raw bytes as delivered by the stream.
    Bytes(Vec<u8>),
    /// UTF-8 text, not yet parsed.
    Text(String),
    /// Parsed JSON.
    Json(serde_json::Value),
}

impl RecordData {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            RecordData::Bytes(bytes) => {
                serde_json::Value::Array(bytes.iter().map(|b| serde_json::Value::from(*b)).collect())
            }
            RecordData::Text(text) => serde_json::Value::String(text.clone()),
            RecordData::Json(json) => json.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamRecord {
    pub data: RecordData,
    pub partition_key: Option<String>,
    pub sequence_number: Option<String>,
}

impl StreamRecord {
    pub fn new(data: RecordData) -> Self {
        StreamRecord {
            data,
            partition_key: None,
            sequence_number: None,
        }
    }

    /// Turns bytes into text and text into JSON.
    ///
    /// # Errors
    ///
    /// `MalformedInput` if the bytes are not UTF-8 or the text is not JSON.
    pub fn decode(self) -> LedgerResult<StreamRecord> {
        let text = match self.data {
            RecordData::Bytes(bytes) => String::from_utf8(bytes)?,
            RecordData::Text(text) => text,
            RecordData::Json(json) => {
                return Ok(StreamRecord {
                    data: RecordData::Json(json),
                    ..self
                })
            }
        };
        Ok(StreamRecord {
            data: RecordData::Json(serde_json::from_str(&text)?),
            partition_key: self.partition_key,
            sequence_number: self.sequence_number,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert("data".to_string(), self.data.to_json());
        if let Some(partition_key) = &self.partition_key {
            object.insert("partitionKey".to_string(), partition_key.clone().into());
        }
        if let Some(sequence_number) = &self.sequence_number {
            object.insert("sequenceNumber".to_string(), sequence_number.clone().into());
        }
        serde_json::Value::Object(object)
    }
}

/// One delivery from a consumer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordBatch {
    pub records: Vec<StreamRecord>,
    pub shard_id: Option<String>,
}

impl RecordBatch {
    pub fn new(records: Vec<StreamRecord>) -> Self {
        RecordBatch {
            records,
            shard_id: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert(
            "records".to_string(),
            serde_json::Value::Array(self.records.iter().map(StreamRecord::to_json).collect()),
        );
        if let Some(shard_id) = &self.shard_id {
            object.insert("shardId".to_string(), shard_id.clone().into());
        }
        serde_json::Value::Object(object)
    }
}

/// Decodes every record of `batch`; one malformed record fails the batch.
pub fn decode_batch(batch: RecordBatch) -> LedgerResult<RecordBatch> {
    let records = batch
        .records
        .into_iter()
        .map(StreamRecord::decode)
        .collect::<LedgerResult<Vec<_>>>()?;
    Ok(RecordBatch {
        records,
        shard_id: batch.shard_id,
    })
}

/// Projects a batch into the items handed to the host.
pub fn shape_batch(batch: &RecordBatch, shape: ResponseShape) -> Vec<serde_json::Value> {
    match shape {
        ResponseShape::Message => vec![batch.to_json()],
        ResponseShape::Record => batch.records.iter().map(StreamRecord::to_json).collect(),
        ResponseShape::Data => batch.records.iter().map(|r| r.data.to_json()).collect(),
    }
}

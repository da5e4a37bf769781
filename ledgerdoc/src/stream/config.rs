use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Where a new consumer group starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialPosition {
    /// The oldest record still retained by the stream.
    TrimHistory,
    /// Only records written after the consumer starts.
    Latest,
}

impl InitialPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitialPosition::TrimHistory => "TRIM_HISTORY",
            InitialPosition::Latest => "LATEST",
        }
    }
}

/// What a trigger emits for each consumed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseShape {
    /// The whole batch as one item.
    Message,
    /// One item per record.
    #[default]
    Record,
    /// One item per record payload.
    Data,
}

impl Display for ResponseShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseShape::Message => write!(f, "message"),
            ResponseShape::Record => write!(f, "record"),
            ResponseShape::Data => write!(f, "data"),
        }
    }
}

impl FromStr for ResponseShape {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(ResponseShape::Message),
            "record" => Ok(ResponseShape::Record),
            "data" => Ok(ResponseShape::Data),
            other => {
                log::error!("Unknown response shape {:?}", other);
                Err(LedgerError::new(
                    &format!("Unknown response shape {:?}", other),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }
}

/// Settings of a stream consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    stream_name: String,
    consumer_group: String,
    create_stream_if_needed: bool,
    initial_position: InitialPosition,
    response_shape: ResponseShape,
}

impl ConsumerConfig {
    pub fn builder(stream_name: &str, consumer_group: &str) -> ConsumerConfigBuilder {
        ConsumerConfigBuilder::new(stream_name, consumer_group)
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn consumer_group(&self) -> &str {
        &self.consumer_group
    }

    pub fn create_stream_if_needed(&self) -> bool {
        self.create_stream_if_needed
    }

    pub fn initial_position(&self) -> InitialPosition {
        self.initial_position
    }

    pub fn response_shape(&self) -> ResponseShape {
        self.response_shape
    }
}

/// Builder for [ConsumerConfig]. Reads from the beginning and emits one item
/// per record unless told otherwise.
pub struct ConsumerConfigBuilder {
    config: ConsumerConfig,
}

impl ConsumerConfigBuilder {
    pub fn new(stream_name: &str, consumer_group: &str) -> Self {
        ConsumerConfigBuilder {
            config: ConsumerConfig {
                stream_name: stream_name.to_string(),
                consumer_group: consumer_group.to_string(),
                create_stream_if_needed: false,
                initial_position: InitialPosition::TrimHistory,
                response_shape: ResponseShape::default(),
            },
        }
    }

    pub fn create_stream_if_needed(mut self, create: bool) -> Self {
        self.config.create_stream_if_needed = create;
        self
    }

    pub fn from_beginning(mut self, from_beginning: bool) -> Self {
        self.config.initial_position = if from_beginning {
            InitialPosition::TrimHistory
        } else {
            InitialPosition::Latest
        };
        self
    }

    pub fn response_shape(mut self, shape: ResponseShape) -> Self {
        self.config.response_shape = shape;
        self
    }

    pub fn build(self) -> LedgerResult<ConsumerConfig> {
        if self.config.stream_name.trim().is_empty() {
            log::error!("Stream name cannot be empty");
            return Err(LedgerError::new(
                "Stream name cannot be empty",
                ErrorKind::ValidationError,
            ));
        }
        if self.config.consumer_group.trim().is_empty() {
            log::error!("Consumer group cannot be empty");
            return Err(LedgerError::new(
                "Consumer group cannot be empty",
                ErrorKind::ValidationError,
            ));
        }
        Ok(self.config)
    }
}

use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use crate::stream::{
    decode_batch, shape_batch, ConsumerConfig, ConsumerGuard, StreamClient,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Connects a guarded consumer to a host that wants shaped items.
///
/// The host may call [StreamTrigger::activate] and [StreamTrigger::manual_trigger]
/// any number of times; only one consumer runs. [StreamTrigger::close] stops it.
pub struct StreamTrigger<C: StreamClient> {
    config: ConsumerConfig,
    guard: ConsumerGuard<C>,
    handler_attached: Mutex<bool>,
}

impl<C: StreamClient> StreamTrigger<C> {
    pub fn new(client: Arc<C>, config: ConsumerConfig) -> Self {
        StreamTrigger {
            config,
            guard: ConsumerGuard::new(client),
            handler_attached: Mutex::new(false),
        }
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    pub fn guard(&self) -> &ConsumerGuard<C> {
        &self.guard
    }

    /// Attaches the batch handler (once) and starts consuming.
    ///
    /// Each batch is decoded and shaped per the configured response shape
    /// before it reaches `emit`. A batch with a malformed record is logged and
    /// dropped.
    pub fn activate<E>(&self, emit: E) -> LedgerResult<()>
    where
        E: Fn(Vec<serde_json::Value>) + Send + Sync + 'static,
    {
        {
            let mut attached = self.handler_attached.lock();
            if !*attached {
                let shape = self.config.response_shape();
                let stream_name = self.config.stream_name().to_string();
                self.guard.client().on_data(Box::new(move |batch| {
                    match decode_batch(batch) {
                        Ok(decoded) => emit(shape_batch(&decoded, shape)),
                        Err(err) => {
                            log::error!("Dropping malformed batch from {}: {}", stream_name, err)
                        }
                    }
                }));
                *attached = true;
            }
        }

        log::debug!(
            "Activating consumer {} on {}",
            self.config.consumer_group(),
            self.config.stream_name()
        );
        self.guard.start_consumer()
    }

    /// Starts consuming for an interactive run. A no-op while already listening.
    pub fn manual_trigger(&self) -> LedgerResult<()> {
        if !*self.handler_attached.lock() {
            log::error!("Manual trigger before activation");
            return Err(LedgerError::new(
                "Trigger must be activated before it can be run manually",
                ErrorKind::InvalidOperation,
            ));
        }
        self.guard.start_consumer()
    }

    pub fn close(&self) -> LedgerResult<()> {
        log::debug!("Closing consumer on {}", self.config.stream_name());
        self.guard.stop_consumer()
    }
}

use crate::errors::LedgerResult;
use crate::stream::StreamClient;
use parking_lot::Mutex;
use std::sync::Arc;

/// Lifecycle state of a guarded consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumerState {
    Idle,
    Listening,
}

/// Wraps a [StreamClient] so that at most one consumer is active.
///
/// Start requests made while listening are logged and ignored. Stop always
/// reaches the client, even when nothing was started. The check-then-start
/// transition happens under a lock that is held until the client has
/// returned, so two concurrent callers can never both start a consumer.
pub struct ConsumerGuard<C: StreamClient> {
    client: Arc<C>,
    state: Mutex<ConsumerState>,
}

impl<C: StreamClient> ConsumerGuard<C> {
    pub fn new(client: Arc<C>) -> Self {
        ConsumerGuard {
            client,
            state: Mutex::new(ConsumerState::Idle),
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn state(&self) -> ConsumerState {
        *self.state.lock()
    }

    pub fn is_listening(&self) -> bool {
        self.state() == ConsumerState::Listening
    }

    /// Starts the consumer unless it is already listening.
    ///
    /// If the client fails to start, the guard returns to idle so that a later
    /// call can try again.
    pub fn start_consumer(&self) -> LedgerResult<()> {
        let mut state = self.state.lock();
        if *state == ConsumerState::Listening {
            log::warn!("Called start_consumer when already listening; ignoring");
            return Ok(());
        }

        *state = ConsumerState::Listening;
        log::debug!("Starting consumer");
        if let Err(err) = self.client.start_consumer() {
            log::error!("Consumer failed to start: {}", err);
            *state = ConsumerState::Idle;
            return Err(err);
        }
        Ok(())
    }

    /// Marks the guard idle and stops the consumer, whatever the current state.
    ///
    /// Takes the same lock as [ConsumerGuard::start_consumer], which holds it
    /// until the client's start returns. A stop issued during a slow start
    /// therefore waits for that start to finish and then stops the consumer.
    pub fn stop_consumer(&self) -> LedgerResult<()> {
        let mut state = self.state.lock();
        if *state == ConsumerState::Idle {
            log::debug!("Stopping consumer that is not listening");
        }
        *state = ConsumerState::Idle;
        self.client.stop_consumer()
    }
}

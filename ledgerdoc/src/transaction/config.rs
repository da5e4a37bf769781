use crate::common::{DEFAULT_MAX_CONCURRENT_TRANSACTIONS, DEFAULT_RETRY_LIMIT};
use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use crate::transaction::MemoryLedger;

/// Settings handed to a ledger driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    ledger_name: String,
    max_concurrent_transactions: usize,
    retry_limit: u32,
}

impl DriverConfig {
    pub fn ledger_name(&self) -> &str {
        &self.ledger_name
    }

    /// Upper bound on transactions a driver keeps open at once.
    pub fn max_concurrent_transactions(&self) -> usize {
        self.max_concurrent_transactions
    }

    /// How many times a conflicting transaction body is re-run before the
    /// conflict is reported to the caller.
    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }
}

/// Fluent builder for [DriverConfig].
///
/// The first configuration error is captured and reported by [LedgerBuilder::build]
/// or [LedgerBuilder::open_in_memory].
///
/// ```rust,ignore
/// let ledger = LedgerBuilder::new("vehicle-registration")
///     .retry_limit(2)
///     .open_in_memory()?;
/// ```
pub struct LedgerBuilder {
    error: Option<LedgerError>,
    config: DriverConfig,
}

impl LedgerBuilder {
    pub fn new(ledger_name: &str) -> Self {
        let error = if ledger_name.trim().is_empty() {
            log::error!("Ledger name cannot be empty");
            Some(LedgerError::new(
                "Ledger name cannot be empty",
                ErrorKind::ValidationError,
            ))
        } else {
            None
        };

        LedgerBuilder {
            error,
            config: DriverConfig {
                ledger_name: ledger_name.to_string(),
                max_concurrent_transactions: DEFAULT_MAX_CONCURRENT_TRANSACTIONS,
                retry_limit: DEFAULT_RETRY_LIMIT,
            },
        }
    }

    pub fn max_concurrent_transactions(mut self, max: usize) -> Self {
        if max == 0 && self.error.is_none() {
            log::error!("Max concurrent transactions must be positive");
            self.error = Some(LedgerError::new(
                "Max concurrent transactions must be positive",
                ErrorKind::ValidationError,
            ));
        }
        self.config.max_concurrent_transactions = max;
        self
    }

    pub fn retry_limit(mut self, retry_limit: u32) -> Self {
        self.config.retry_limit = retry_limit;
        self
    }

    pub fn build(self) -> LedgerResult<DriverConfig> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.config),
        }
    }

    /// Builds the configuration and opens an in-process ledger with it.
    pub fn open_in_memory(self) -> LedgerResult<MemoryLedger> {
        Ok(MemoryLedger::new(self.build()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerBuilder::new("ledger").build().unwrap();
        assert_eq!(config.ledger_name(), "ledger");
        assert_eq!(config.max_concurrent_transactions(), 10);
        assert_eq!(config.retry_limit(), 4);
    }

    #[test]
    fn test_overrides() {
        let config = LedgerBuilder::new("ledger")
            .max_concurrent_transactions(2)
            .retry_limit(0)
            .build()
            .unwrap();
        assert_eq!(config.max_concurrent_transactions(), 2);
        assert_eq!(config.retry_limit(), 0);
    }

    #[test]
    fn test_empty_name_is_reported_on_build() {
        let err = LedgerBuilder::new("  ").retry_limit(1).build().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_first_error_wins() {
        let err = LedgerBuilder::new("")
            .max_concurrent_transactions(0)
            .build()
            .unwrap_err();
        assert_eq!(err.message(), "Ledger name cannot be empty");
    }
}

use ledgerdoc::errors::LedgerResult;
use ledgerdoc::repository::Repository;
use ledgerdoc::transaction::{LedgerBuilder, MemoryLedger};
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

pub const TEST_COLLECTION: &str = "Person";

/// Runs `before`, then `test` with the context it produced, then `after`.
///
/// `after` runs even when `test` fails or panics. Any failure panics with the
/// stage that failed and the error's debug output.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> LedgerResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> LedgerResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> LedgerResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| test(ctx.clone())));
    let after_result = after(ctx);
    let elapsed = start_time.elapsed();

    match result {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            let backtrace = Backtrace::capture().to_string();
            eprintln!("\n==================== TEST FAILED ({:?}) ====================", elapsed);
            eprintln!("Error: {:?}", e);
            if !backtrace.is_empty() && !backtrace.contains("disabled") {
                eprintln!("\nBacktrace:\n{}", backtrace);
            }
            panic!("Test failed: {}", e);
        }
        Err(panic_err) => std::panic::resume_unwind(panic_err),
    }

    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

#[derive(Clone)]
pub struct TestContext {
    ledger: Arc<MemoryLedger>,
    repository: Repository,
}

impl TestContext {
    pub fn new(ledger: MemoryLedger, repository: Repository) -> Self {
        Self {
            ledger: Arc::new(ledger),
            repository,
        }
    }

    pub fn ledger(&self) -> Arc<MemoryLedger> {
        self.ledger.clone()
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }
}

pub fn test_ledger_name() -> String {
    format!("ledger-{}", std::process::id())
}

/// A fresh in-memory ledger with a repository over [TEST_COLLECTION].
pub fn create_test_context() -> LedgerResult<TestContext> {
    create_test_context_with_retries(ledgerdoc::common::DEFAULT_RETRY_LIMIT)
}

pub fn create_test_context_with_retries(retry_limit: u32) -> LedgerResult<TestContext> {
    let ledger = LedgerBuilder::new(&test_ledger_name())
        .retry_limit(retry_limit)
        .open_in_memory()?;
    let repository = Repository::new(TEST_COLLECTION)?;
    Ok(TestContext::new(ledger, repository))
}

/// Drops the context. An in-memory ledger holds nothing outside the process,
/// so this only reports what was left behind.
pub fn cleanup(ctx: TestContext) -> LedgerResult<()> {
    log::debug!(
        "Discarding ledger {} with {} documents in {}",
        ctx.ledger.config().ledger_name(),
        ctx.ledger.count(TEST_COLLECTION),
        TEST_COLLECTION
    );
    Ok(())
}

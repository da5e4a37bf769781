use ledgerdoc::common::Value;
use ledgerdoc::doc;
use ledgerdoc::errors::{ErrorKind, LedgerError};
use ledgerdoc::transaction::LedgerDriver;
use ledgerdoc_int_test::test_util::{
    cleanup, create_test_context, create_test_context_with_retries, run_test, TEST_COLLECTION,
};
use std::thread;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_conflicting_commit_is_retried() {
    run_test(
        || create_test_context_with_retries(2),
        |ctx| {
            let ledger = ctx.ledger();
            let repository = ctx.repository();
            ledger.inject_conflicts(2);

            ledger.execute_lambda(|txn| {
                repository.upsert(txn, &doc! { name: "a" }, doc! { age: 5 })
            })?;

            assert_eq!(ledger.attempts(), 3);
            assert_eq!(ledger.count(TEST_COLLECTION), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_conflicts_beyond_retry_limit_fail() {
    run_test(
        || create_test_context_with_retries(1),
        |ctx| {
            let ledger = ctx.ledger();
            let repository = ctx.repository();
            ledger.inject_conflicts(5);

            let err = ledger
                .execute_lambda(|txn| repository.insert(txn, doc! { name: "a" }))
                .unwrap_err();

            assert_eq!(err.kind(), &ErrorKind::OccConflict);
            assert_eq!(ledger.attempts(), 2);
            assert_eq!(ledger.count(TEST_COLLECTION), 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_failed_body_rolls_back_earlier_writes() {
    run_test(
        || create_test_context(),
        |ctx| {
            let ledger = ctx.ledger();
            let repository = ctx.repository();

            let result: Result<(), LedgerError> = ledger.execute_lambda(|txn| {
                repository.insert(txn, doc! { name: "a" })?;
                Err(LedgerError::new("stop", ErrorKind::InternalError))
            });

            assert_eq!(result.unwrap_err().message(), "stop");
            assert_eq!(ledger.count(TEST_COLLECTION), 0);
            assert_eq!(ledger.attempts(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_concurrent_upserts_leave_one_document() {
    run_test(
        || create_test_context(),
        |ctx| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let ledger = ctx.ledger();
                    let repository = ctx.repository().clone();
                    thread::spawn(move || {
                        ledger.execute_lambda(|txn| {
                            repository.upsert(txn, &doc! { name: "shared" }, doc! { writer: i })
                        })
                    })
                })
                .collect();

            for handle in handles {
                handle.join().expect("writer thread panicked")?;
            }

            let documents = ctx.ledger().documents(TEST_COLLECTION);
            assert_eq!(documents.len(), 1);
            assert!(documents[0].get("writer").and_then(Value::as_i64).is_some());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

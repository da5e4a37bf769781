use ledgerdoc::collection::Document;
use ledgerdoc::common::{Value, CREATED_AT, DOC_ID, UPDATED_AT};
use ledgerdoc::doc;
use ledgerdoc::errors::ErrorKind;
use ledgerdoc::reconcile::reconcile;
use ledgerdoc::transaction::LedgerDriver;
use ledgerdoc_int_test::test_util::{cleanup, create_test_context, run_test, TEST_COLLECTION};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_upsert_is_idempotent() {
    run_test(
        || create_test_context(),
        |ctx| {
            let ledger = ctx.ledger();
            let repository = ctx.repository();

            for _ in 0..2 {
                ledger.execute_lambda(|txn| {
                    repository.upsert(txn, &doc! { name: "a" }, doc! { age: 5 })
                })?;
            }

            let documents = ledger.documents(TEST_COLLECTION);
            assert_eq!(documents.len(), 1);
            assert_eq!(documents[0].get("name"), Some(&Value::from("a")));
            assert_eq!(documents[0].get("age"), Some(&Value::from(5)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_ambiguous_upsert_writes_nothing() {
    run_test(
        || create_test_context(),
        |ctx| {
            let ledger = ctx.ledger();
            let repository = ctx.repository();

            ledger.execute_lambda(|txn| {
                repository.insert(txn, doc! { name: "a", age: 1 })?;
                repository.insert(txn, doc! { name: "a", age: 2 })
            })?;

            let err = ledger
                .execute_lambda(|txn| repository.upsert(txn, &doc! { name: "a" }, doc! { age: 9 }))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::AmbiguousUpsert);
            assert!(err.message().contains("found 2 documents"));

            let ages: Vec<_> = ledger
                .documents(TEST_COLLECTION)
                .iter()
                .filter_map(|d| d.get("age").and_then(Value::as_i64))
                .collect();
            assert_eq!(ages, vec![1, 2]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_insert_stamps_equal_timestamps() {
    run_test(
        || create_test_context(),
        |ctx| {
            let ledger = ctx.ledger();
            let repository = ctx.repository();

            ledger.execute_lambda(|txn| repository.insert(txn, doc! { name: "b" }))?;

            let documents = ledger.documents(TEST_COLLECTION);
            let created = documents[0].get(CREATED_AT).cloned();
            assert!(created.as_ref().and_then(Value::as_timestamp).is_some());
            assert_eq!(created.as_ref(), documents[0].get(UPDATED_AT));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_then_find_where_with_list() {
    run_test(
        || create_test_context(),
        |ctx| {
            let ledger = ctx.ledger();
            let repository = ctx.repository();

            ledger.execute_lambda(|txn| {
                for name in ["a", "b", "c"] {
                    repository.insert(txn, doc! { name: name, active: false })?;
                }
                Ok(())
            })?;
            ledger.execute_lambda(|txn| {
                repository.update(txn, doc! { active: true }, &doc! { name: ["a", "c"] })
            })?;

            let active = ledger.execute_lambda(|txn| {
                repository.find_where(txn, &doc! { active: true })
            })?;
            let names: Vec<_> = active
                .iter()
                .filter_map(|d| d.get("name").and_then(Value::as_string))
                .collect();
            assert_eq!(names, vec!["a", "c"]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_nested_insert_and_hydration() {
    run_test(
        || create_test_context(),
        |ctx| {
            let ledger = ctx.ledger();
            let repository = ctx.repository();

            let rows = ledger.execute_lambda(|txn| {
                let mut rows = repository.insert(txn, doc! { name: "owner" })?;
                let parent = repository.insert_into(
                    txn,
                    "vehicles",
                    doc! { vin: "1HVBBAANXWH544237" },
                    &doc! { name: "owner" },
                )?;
                let mut identity = Document::new();
                identity.put(DOC_ID, parent)?;
                rows.push(identity);
                reconcile(repository, txn, rows)
            })?;

            assert_eq!(rows.len(), 1);
            let vehicles = rows[0].get("vehicles").and_then(Value::as_array).cloned();
            assert_eq!(vehicles.map(|v| v.len()), Some(1));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_nested_insert_without_parent() {
    run_test(
        || create_test_context(),
        |ctx| {
            let ledger = ctx.ledger();
            let repository = ctx.repository();

            let err = ledger
                .execute_lambda(|txn| {
                    repository.insert_into(txn, "vehicles", doc! { vin: "x" }, &doc! { name: "nobody" })
                })
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_list_predicate_upsert_never_duplicates() {
    run_test(
        || create_test_context(),
        |ctx| {
            let ledger = ctx.ledger();
            let repository = ctx.repository();

            for _ in 0..2 {
                let err = ledger
                    .execute_lambda(|txn| {
                        repository.upsert(txn, &doc! { tags: [1, 2] }, doc! { age: 5 })
                    })
                    .unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::MalformedInput);
            }
            assert_eq!(ledger.count(TEST_COLLECTION), 0);

            ledger.execute_lambda(|txn| repository.insert(txn, doc! { name: "a", tags: 1 }))?;
            for age in [5, 6] {
                ledger.execute_lambda(|txn| {
                    repository.upsert(txn, &doc! { tags: [1, 2] }, doc! { age: age })
                })?;
            }

            let documents = ledger.documents(TEST_COLLECTION);
            assert_eq!(documents.len(), 1);
            assert_eq!(documents[0].get("age"), Some(&Value::from(6)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

use indoc::indoc;
use keel::{Database, Executor, Model, ModelTracking, is_concurrent_transaction};
use std::sync::LazyLock;
use tokio::sync::Mutex;

pub async fn concurrency<E: Executor>(database: &Database<E>) {
    #[derive(Model, Default, Debug, Clone)]
    struct Ledger {
        #[db(",pk")]
        id: i64,
        balance: i64,
        tracking: ModelTracking,
    }

    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute("DROP TABLE IF EXISTS ledgers", Vec::new())
        .await
        .expect("Failed to drop the ledgers table");
    database
        .execute(
            indoc! {"
                CREATE TABLE ledgers (
                    id BIGINT NOT NULL PRIMARY KEY,
                    balance BIGINT NOT NULL,
                    revision BIGINT NOT NULL DEFAULT 0
                )
            "},
            Vec::new(),
        )
        .await
        .expect("Failed to create the ledgers table");
    let ledgers = database
        .collection::<Ledger>()
        .expect("Failed to create the ledgers collection");

    let mut ledger = Ledger {
        id: 42,
        balance: 100,
        ..Default::default()
    };
    ledgers
        .put(&mut ledger)
        .await
        .expect("Failed to insert the ledger");
    assert_eq!(ledger.id, 42);

    // Two readers of the same row
    let mut first = Ledger {
        id: 42,
        ..Default::default()
    };
    let mut second = first.clone();
    ledgers
        .get(&mut first)
        .await
        .expect("Failed to get the first copy");
    ledgers
        .get(&mut second)
        .await
        .expect("Failed to get the second copy");

    first.balance += 10;
    ledgers
        .put(&mut first)
        .await
        .expect("The first writer must succeed");

    second.balance -= 10;
    let error = ledgers
        .put(&mut second)
        .await
        .expect_err("The stale writer must be rejected");
    assert!(is_concurrent_transaction(&error));

    // Reloading picks up the new revision
    ledgers
        .get(&mut second)
        .await
        .expect("Failed to reload the second copy");
    assert_eq!(second.balance, 110);
    second.balance -= 10;
    ledgers
        .put(&mut second)
        .await
        .expect("The reloaded writer must succeed");

    let mut check = Ledger {
        id: 42,
        ..Default::default()
    };
    ledgers
        .get(&mut check)
        .await
        .expect("Failed to get the ledger");
    assert_eq!(check.balance, 100);
    assert_eq!(check.tracking.stored_revision(), 2);

    // Updating a deleted row is a conflict as well
    ledgers
        .delete(&mut check)
        .await
        .expect("Failed to delete the ledger");
    assert!(!check.tracking.is_inserted());
    let error = ledgers
        .put(&mut first)
        .await
        .expect_err("Updating a deleted row must fail");
    assert!(is_concurrent_transaction(&error));
}

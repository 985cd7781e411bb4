use indoc::indoc;
use keel::{Database, Executor, Model, ModelTracking, is_not_found};
use std::sync::LazyLock;
use tokio::sync::Mutex;

pub async fn simple<E: Executor>(database: &Database<E>) {
    #[derive(Model, Default, Debug, Clone, PartialEq)]
    #[model(table = "simple_accounts")]
    struct Account {
        #[db(",pk")]
        id: u64,
        #[db("display_name")]
        name: String,
        #[db(",omitempty")]
        code: String,
        score: i32,
        nickname: Option<String>,
        #[db("-")]
        scratch: String,
        tracking: ModelTracking,
    }

    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute("DROP TABLE IF EXISTS simple_accounts", Vec::new())
        .await
        .expect("Failed to drop the simple_accounts table");
    database
        .execute(
            indoc! {"
                CREATE TABLE simple_accounts (
                    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
                    display_name VARCHAR(64) NOT NULL,
                    code VARCHAR(64) NOT NULL DEFAULT 'none',
                    score INT NOT NULL,
                    nickname VARCHAR(64) NULL,
                    revision BIGINT NOT NULL DEFAULT 0
                )
            "},
            Vec::new(),
        )
        .await
        .expect("Failed to create the simple_accounts table");
    let accounts = database
        .collection::<Account>()
        .expect("Failed to create the accounts collection");

    // Insert
    let mut account = Account {
        name: "barv".into(),
        score: 7,
        scratch: "not stored".into(),
        ..Default::default()
    };
    accounts
        .put(&mut account)
        .await
        .expect("Failed to insert the account");
    assert_ne!(account.id, 0);
    assert!(account.tracking.is_inserted());
    assert_eq!(account.tracking.revision(), 1);

    // Get
    let mut loaded = Account {
        id: account.id,
        ..Default::default()
    };
    accounts
        .get(&mut loaded)
        .await
        .expect("Failed to get the account");
    assert_eq!(loaded.name, "barv");
    assert_eq!(loaded.code, "none");
    assert_eq!(loaded.score, 7);
    assert_eq!(loaded.nickname, None);
    assert_eq!(loaded.scratch, "");
    assert!(loaded.tracking.is_inserted());
    assert_eq!(loaded.tracking.stored_revision(), 0);

    // Update
    loaded.code = "bar".into();
    loaded.nickname = Some("b".into());
    accounts
        .put(&mut loaded)
        .await
        .expect("Failed to update the account");
    let mut reloaded = Account {
        id: account.id,
        ..Default::default()
    };
    accounts
        .get(&mut reloaded)
        .await
        .expect("Failed to get the updated account");
    assert_eq!(reloaded.code, "bar");
    assert_eq!(reloaded.nickname.as_deref(), Some("b"));
    assert_eq!(reloaded.tracking.stored_revision(), 1);
    assert_eq!(reloaded, loaded);

    // Missing
    let mut missing = Account {
        id: account.id + 1000,
        name: "untouched".into(),
        ..Default::default()
    };
    let error = accounts
        .get(&mut missing)
        .await
        .expect_err("A missing account must not be found");
    assert!(is_not_found(&error));
    assert_eq!(missing.name, "untouched");
    assert!(!missing.tracking.is_inserted());

    // Filtered get
    let mut filtered = Account {
        id: account.id,
        ..Default::default()
    };
    let error = accounts
        .clone()
        .filter("score >", 100)
        .get(&mut filtered)
        .await
        .expect_err("The filter must hide the account");
    assert!(is_not_found(&error));
}

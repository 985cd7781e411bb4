use indoc::indoc;
use keel::{Database, Executor, Model, ModelTracking};
use std::sync::LazyLock;
use tokio::sync::Mutex;

pub async fn truncate<E: Executor>(database: &Database<E>) {
    #[derive(Model, Default, Debug, Clone)]
    #[model(table = "events")]
    struct Event {
        #[db(",pk")]
        id: u64,
        kind: String,
        tracking: ModelTracking,
    }

    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute("DROP TABLE IF EXISTS events", Vec::new())
        .await
        .expect("Failed to drop the events table");
    database
        .execute(
            indoc! {"
                CREATE TABLE events (
                    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
                    kind VARCHAR(32) NOT NULL,
                    revision BIGINT NOT NULL DEFAULT 0
                )
            "},
            Vec::new(),
        )
        .await
        .expect("Failed to create the events table");
    let events = database
        .collection::<Event>()
        .expect("Failed to create the events collection");
    for kind in ["login", "logout", "login"] {
        let mut event = Event {
            kind: kind.into(),
            ..Default::default()
        };
        events
            .put(&mut event)
            .await
            .expect("Failed to insert the event");
    }
    assert_eq!(events.count().await.expect("Failed to count"), 3);

    events.truncate().await.expect("Failed to truncate events");
    assert_eq!(events.count().await.expect("Failed to count"), 0);

    // The auto increment starts over
    let mut event = Event {
        kind: "login".into(),
        ..Default::default()
    };
    events
        .put(&mut event)
        .await
        .expect("Failed to insert after truncate");
    assert_eq!(event.id, 1);
}

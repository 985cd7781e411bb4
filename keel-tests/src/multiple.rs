use indoc::indoc;
use keel::{Database, Executor, Model, ModelTracking, MultiError, is_not_found};
use std::sync::LazyLock;
use tokio::sync::Mutex;

pub async fn multiple<E: Executor>(database: &Database<E>) {
    #[derive(Model, Default, Debug, Clone, PartialEq)]
    struct Article {
        #[db(",pk")]
        id: u32,
        title: String,
        tracking: ModelTracking,
    }

    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute("DROP TABLE IF EXISTS articles", Vec::new())
        .await
        .expect("Failed to drop the articles table");
    database
        .execute(
            indoc! {"
                CREATE TABLE articles (
                    id INT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
                    title VARCHAR(128) NOT NULL,
                    revision BIGINT NOT NULL DEFAULT 0
                )
            "},
            Vec::new(),
        )
        .await
        .expect("Failed to create the articles table");
    let articles = database
        .collection::<Article>()
        .expect("Failed to create the articles collection");

    let mut ids = Vec::new();
    for title in ["alpha", "bravo", "charlie"] {
        let mut article = Article {
            title: title.into(),
            ..Default::default()
        };
        articles
            .put(&mut article)
            .await
            .expect("Failed to insert the article");
        ids.push(article.id);
    }

    // All found, in the order of the keys
    let mut result = Vec::new();
    articles
        .get_multi([ids[2], ids[0], ids[2]], &mut result)
        .await
        .expect("Failed to get the articles");
    let titles: Vec<_> = result.iter().map(|v| v.title.as_str()).collect();
    assert_eq!(titles, ["charlie", "alpha", "charlie"]);
    assert!(result.iter().all(|v| v.tracking.is_inserted()));

    // One missing
    let missing = ids[2] + 100;
    let error = articles
        .get_multi([ids[1], missing, ids[0]], &mut result)
        .await
        .expect_err("A missing key must fail");
    let errors = error
        .downcast_ref::<MultiError>()
        .expect("The error must be a MultiError");
    assert_eq!(errors.len(), 3);
    assert!(errors.get(0).is_none());
    assert!(errors.get(1).is_some_and(is_not_found));
    assert!(errors.get(2).is_none());
    assert_eq!(result.len(), 3);
    assert_eq!(result[0].title, "bravo");
    assert_eq!(result[1], Article::default());
    assert_eq!(result[2].title, "alpha");

    // No keys
    articles
        .get_multi(Vec::<u32>::new(), &mut result)
        .await
        .expect("Empty keys must succeed");
    assert!(result.is_empty());
}

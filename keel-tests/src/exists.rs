use indoc::indoc;
use keel::{Database, Executor, Model, ModelTracking};
use std::sync::LazyLock;
use tokio::sync::Mutex;

pub async fn exists<E: Executor>(database: &Database<E>) {
    #[derive(Model, Default, Debug, Clone)]
    struct Author {
        #[db(",pk")]
        id: i64,
        name: String,
        tracking: ModelTracking,
    }

    #[derive(Model, Default, Debug, Clone)]
    struct Book {
        #[db(",pk")]
        id: i64,
        author_id: i64,
        genre: String,
        tracking: ModelTracking,
    }

    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    // Setup
    for statement in [
        "DROP TABLE IF EXISTS books",
        "DROP TABLE IF EXISTS authors",
        indoc! {"
            CREATE TABLE authors (
                id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
                name VARCHAR(64) NOT NULL,
                revision BIGINT NOT NULL DEFAULT 0
            )
        "},
        indoc! {"
            CREATE TABLE books (
                id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
                author_id BIGINT NOT NULL,
                genre VARCHAR(64) NOT NULL,
                revision BIGINT NOT NULL DEFAULT 0
            )
        "},
    ] {
        database
            .execute(statement, Vec::new())
            .await
            .expect("Failed to prepare the authors and books tables");
    }
    let authors = database
        .collection::<Author>()
        .expect("Failed to create the authors collection");
    let books = database
        .collection::<Book>()
        .expect("Failed to create the books collection");
    for (name, genres) in [
        ("Ursula", &["fantasy", "science fiction"][..]),
        ("Agatha", &["mystery"][..]),
        ("Italo", &[][..]),
    ] {
        let mut author = Author {
            name: name.into(),
            ..Default::default()
        };
        authors
            .put(&mut author)
            .await
            .expect("Failed to insert the author");
        for genre in genres {
            let mut book = Book {
                author_id: author.id,
                genre: genre.to_string(),
                ..Default::default()
            };
            books
                .put(&mut book)
                .await
                .expect("Failed to insert the book");
        }
    }

    // Authors with at least one book
    let mut result = Vec::new();
    authors
        .clone()
        .alias("a")
        .filter_exists(&books, "books.author_id = a.id")
        .order("name")
        .get_all(&mut result)
        .await
        .expect("Failed to get the published authors");
    let names: Vec<_> = result.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, ["Agatha", "Ursula"]);

    // The sub collection filters are bound too
    let count = authors
        .clone()
        .alias("a")
        .filter_exists(
            &books.clone().filter("genre", "mystery"),
            "books.author_id = a.id",
        )
        .count()
        .await
        .expect("Failed to count the mystery authors");
    assert_eq!(count, 1);
}

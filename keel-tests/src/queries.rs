use indoc::indoc;
use keel::{AsValue, Database, Executor, Model, ModelTracking, escape_like, is_not_found};
use std::sync::LazyLock;
use tokio::sync::Mutex;

pub async fn queries<E: Executor>(database: &Database<E>) {
    #[derive(Model, Default, Debug, Clone)]
    struct Member {
        #[db(",pk")]
        id: i64,
        name: String,
        code: String,
        age: u8,
        tracking: ModelTracking,
    }

    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    // Setup
    database
        .execute("DROP TABLE IF EXISTS members", Vec::new())
        .await
        .expect("Failed to drop the members table");
    database
        .execute(
            indoc! {"
                CREATE TABLE members (
                    id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
                    name VARCHAR(64) NOT NULL,
                    code VARCHAR(64) NOT NULL,
                    age TINYINT UNSIGNED NOT NULL,
                    revision BIGINT NOT NULL DEFAULT 0
                )
            "},
            Vec::new(),
        )
        .await
        .expect("Failed to create the members table");
    let members = database
        .collection::<Member>()
        .expect("Failed to create the members collection");
    for (name, code, age) in [
        ("foo", "f", 31),
        ("barv", "bar", 25),
        ("ba%z", "baz", 40),
        ("qux", "q", 18),
    ] {
        let mut member = Member {
            name: name.into(),
            code: code.into(),
            age,
            ..Default::default()
        };
        members
            .put(&mut member)
            .await
            .expect("Failed to insert the member");
    }

    // First
    let mut member = Member::default();
    members
        .clone()
        .filter("name", "barv")
        .first(&mut member)
        .await
        .expect("Failed to find barv");
    assert_eq!(member.code, "bar");
    assert!(member.tracking.is_inserted());
    let error = members
        .clone()
        .filter("name", "nobody")
        .first(&mut Member::default())
        .await
        .expect_err("Nobody must not be found");
    assert!(is_not_found(&error));

    // Order and pagination
    let mut result = Vec::new();
    members
        .clone()
        .order("age")
        .limit(1)
        .offset(1)
        .get_all(&mut result)
        .await
        .expect("Failed to get the second youngest member");
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].name, "barv");
    members
        .clone()
        .order("-age")
        .get_all(&mut result)
        .await
        .expect("Failed to get the members by age");
    let names: Vec<_> = result.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, ["ba%z", "foo", "barv", "qux"]);

    // Like with escaped wildcards
    members
        .clone()
        .filter("name LIKE", format!("{}%", escape_like("ba%")))
        .get_all(&mut result)
        .await
        .expect("Failed to filter with LIKE");
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].code, "baz");

    // Count ignores pagination
    let adults = members.clone().filter("age >=", 21);
    assert_eq!(
        adults
            .clone()
            .limit(1)
            .count()
            .await
            .expect("Failed to count"),
        3
    );

    // Iterator
    let mut cursor = adults.clone().order("id").iterator();
    let mut member = Member::default();
    let mut ages = Vec::new();
    while cursor.next(&mut member).await.expect("Failed to iterate") {
        ages.push(member.age);
    }
    assert_eq!(ages, [31, 25, 40]);
    assert!(cursor.is_closed());
    cursor.close();
    assert!(
        !cursor
            .next(&mut member)
            .await
            .expect("A closed cursor has no rows")
    );

    // Delete
    let mut oldest = Member::default();
    members
        .clone()
        .order("-age")
        .first(&mut oldest)
        .await
        .expect("Failed to find the oldest member");
    members
        .delete(&mut oldest)
        .await
        .expect("Failed to delete the oldest member");
    assert!(!oldest.tracking.is_inserted());
    assert_eq!(members.count().await.expect("Failed to count"), 3);
    let error = members
        .get(&mut oldest)
        .await
        .expect_err("The deleted member must be gone");
    assert!(is_not_found(&error));

    // Raw statement
    let affected = database
        .execute(
            "UPDATE members SET code = ? WHERE age < ?",
            vec!["young".as_value(), 30.as_value()],
        )
        .await
        .expect("Failed to run the raw update");
    assert_eq!(affected.rows_affected, 2);
}

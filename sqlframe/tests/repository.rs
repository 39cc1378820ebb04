mod common;

use chrono::{DateTime, Utc};
use common::{row, FakeExecutor};
use sqlframe::{Entity, Error, MappingError, Repository, Value};

#[derive(Debug, Default, Clone, PartialEq, Entity)]
#[entity(table = "users")]
struct User {
    id: i64,
    name: String,
    email: String,
    #[entity(skip)]
    confirmed: bool,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

fn user(name: &str) -> User {
    User {
        name: name.to_owned(),
        email: format!("{name}@example.com"),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_assigns_generated_id() -> anyhow::Result<()> {
    let executor = FakeExecutor::mysql();
    executor.set_next_id(12);
    let users = Repository::<User>::new(executor.clone());

    let mut john = user("john");
    users.create(&mut john).await?;

    assert_eq!(john.id, 12);
    assert!(john.created_at.is_some());
    assert_eq!(john.created_at, john.updated_at);

    let (sql, binds) = executor.last().unwrap();
    assert_eq!(
        sql,
        "INSERT INTO users (name, email, created_at, updated_at) VALUES (?, ?, ?, ?)"
    );
    assert_eq!(binds[0], Value::from("john"));
    assert_eq!(binds[1], Value::from("john@example.com"));
    assert_eq!(binds[2], Value::from(john.created_at));

    Ok(())
}

#[tokio::test]
async fn create_keeps_assigned_id() -> anyhow::Result<()> {
    let executor = FakeExecutor::mysql();
    let users = Repository::<User>::new(executor.clone());

    let mut jane = User { id: 40, ..user("jane") };
    users.create(&mut jane).await?;

    assert_eq!(jane.id, 40);
    assert_eq!(
        executor.last().unwrap().0,
        "INSERT INTO users (id, name, email, created_at, updated_at) VALUES (?, ?, ?, ?, ?)"
    );

    Ok(())
}

#[tokio::test]
async fn find_by_id() -> anyhow::Result<()> {
    let executor = FakeExecutor::postgres();
    let users = Repository::<User>::new(executor.clone());

    executor.push_rows(vec![row([
        ("id", Value::Int(3)),
        ("name", Value::from("john")),
        ("email", Value::from("john@example.com")),
        ("created_at", Value::Null),
        ("updated_at", Value::Null),
    ])]);

    let found = users.find_by_id(3).await?.unwrap();
    assert_eq!(found.id, 3);
    assert_eq!(found.name, "john");
    assert!(!found.confirmed);

    assert_eq!(users.find_by_id(4).await?, None);
    assert!(matches!(
        users.find_by_id_or_fail(5).await,
        Err(Error::NotFound { table }) if table == "users"
    ));

    assert_eq!(
        executor.statements()[0],
        (
            "SELECT * FROM users WHERE id = ? LIMIT 1".to_owned(),
            vec![Value::Int(3)]
        )
    );

    Ok(())
}

#[tokio::test]
async fn find_all_and_count() -> anyhow::Result<()> {
    let executor = FakeExecutor::mysql();
    let users = Repository::<User>::new(executor.clone());

    executor.push_rows(vec![
        row([("id", Value::Int(1)), ("name", Value::from("a"))]),
        row([("id", Value::Int(2)), ("name", Value::from("b"))]),
    ]);
    executor.push_rows(vec![row([("id", Value::Int(2)), ("name", Value::from("b"))])]);
    executor.push_rows(vec![row([("count", Value::Int(2))])]);

    let all = users.find_all().await?;
    assert_eq!(all.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1, 2]);

    let filtered = users
        .find_all_where("id > ? AND name <> ?", vec![1.into(), "a".into()])
        .await?;
    assert_eq!(filtered.len(), 1);

    assert_eq!(users.count().await?, 2);

    assert_eq!(
        executor.sql(),
        vec![
            "SELECT * FROM users",
            "SELECT * FROM users WHERE id > ? AND name <> ?",
            "SELECT COUNT(*) as count FROM users",
        ]
    );

    Ok(())
}

#[tokio::test]
async fn mapping_errors_surface() {
    let executor = FakeExecutor::mysql();
    let users = Repository::<User>::new(executor.clone());

    executor.push_rows(vec![row([("id", Value::from("not a number"))])]);

    assert!(matches!(
        users.find_all().await,
        Err(Error::Mapping(MappingError::TypeMismatch { column, .. })) if column == "id"
    ));
}

#[tokio::test]
async fn update_skips_identity_and_creation_time() -> anyhow::Result<()> {
    let executor = FakeExecutor::mysql();
    let users = Repository::<User>::new(executor.clone());

    let mut john = User { id: 9, ..user("john") };
    assert_eq!(users.update(&mut john).await?, 1);
    assert!(john.updated_at.is_some());
    assert!(john.created_at.is_none());

    let (sql, binds) = executor.last().unwrap();
    assert_eq!(
        sql,
        "UPDATE users SET name = ?, email = ?, updated_at = ? WHERE id = ?"
    );
    assert_eq!(binds.last(), Some(&Value::Int(9)));

    Ok(())
}

#[tokio::test]
async fn writes_require_an_identifier() {
    let executor = FakeExecutor::mysql();
    let users = Repository::<User>::new(executor.clone());

    let mut john = user("john");

    assert!(matches!(
        users.update(&mut john).await,
        Err(Error::Mapping(MappingError::MissingIdentifier("User")))
    ));
    assert!(matches!(
        users.delete(&john).await,
        Err(Error::Mapping(MappingError::MissingIdentifier(_)))
    ));
    assert!(executor.statements().is_empty());
}

#[tokio::test]
async fn delete() -> anyhow::Result<()> {
    let executor = FakeExecutor::postgres();
    let users = Repository::<User>::new(executor.clone());

    users.delete(&User { id: 4, ..user("john") }).await?;

    assert_eq!(
        executor.last(),
        Some(("DELETE FROM users WHERE id = ?".to_owned(), vec![Value::Int(4)]))
    );

    Ok(())
}

#[tokio::test]
async fn store_errors_propagate() {
    let executor = FakeExecutor::mysql();
    executor.fail_on("INSERT");
    let users = Repository::<User>::new(executor.clone());

    assert!(matches!(
        users.create(&mut user("john")).await,
        Err(Error::Builder(message)) if message.starts_with("scripted failure")
    ));
}

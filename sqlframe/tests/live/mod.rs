use std::{io, time::Duration};

use chrono::{DateTime, Utc};
use futures_util::TryFutureExt;
use sqlframe::{
    async_trait, Connection, ConnectionError, DatabaseConfig, Decimal, Entity, Error, Executor,
    Migration, MigrationRegistry, Migrator, QueryBuilder, Repository, Result, Schema,
};

#[derive(Debug, Default, Clone, PartialEq, Entity)]
#[entity(table = "live_users")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub balance: Decimal,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn user(name: &str, age: i32) -> User {
    User {
        name: name.to_owned(),
        email: format!("{name}@example.com"),
        age,
        balance: Decimal::new(1050, 2),
        ..Default::default()
    }
}

async fn create_users_table(schema: &Schema) -> Result<()> {
    schema.drop_if_exists(User::table_name()).await?;
    schema
        .create(User::table_name(), |table| {
            table.id();
            table.string("name", 255);
            table.string("email", 255).unique();
            table.integer("age", false).default(0);
            table.decimal("balance", 10, 2).default(0);
            table.timestamps();
        })
        .await
}

pub async fn test_repository(conn: &Connection) -> anyhow::Result<()> {
    let schema = Schema::new(conn.clone());
    create_users_table(&schema).await?;

    let users = Repository::<User>::new(conn.clone());

    let mut john = user("john", 30);
    let mut jane = user("jane", 25);
    users.create(&mut john).await?;
    users.create(&mut jane).await?;

    assert!(john.id > 0);
    assert_ne!(john.id, jane.id);
    assert_eq!(users.count().await?, 2);

    let found = users.find_by_id_or_fail(john.id).await?;
    assert_eq!(found.email, "john@example.com");
    assert_eq!(found.created_at, john.created_at);
    assert_eq!(found.balance, Decimal::new(1050, 2));
    assert_eq!(found.balance.to_string(), "10.50");

    let adults = users
        .find_all_where("age >= ? AND name <> ?", vec![26.into(), "nobody".into()])
        .await?;
    assert_eq!(adults, vec![found.clone()]);

    jane.age = 26;
    jane.balance = Decimal::new(-99_999_999, 2);
    users.update(&mut jane).await?;
    let jane = users
        .find_by_column("email", "jane@example.com")
        .await?
        .map(|u| (u.age, u.balance));
    assert_eq!(jane, Some((26, Decimal::new(-99_999_999, 2))));

    users.delete(&john).await?;
    assert!(matches!(
        users.find_by_id_or_fail(john.id).await,
        Err(Error::NotFound { .. })
    ));

    let rows = QueryBuilder::table(User::table_name())
        .select(["name", "age", "balance"])
        .where_in("name", ["jane", "john"])
        .order_by("name", "desc")
        .fetch_rows(conn)
        .await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].try_get::<String>("name")?, "jane");
    assert_eq!(rows[0].try_get::<i64>("age")?, 26);
    assert_eq!(rows[0].try_get::<String>("balance")?, "-999999.99");

    schema.drop(User::table_name()).await?;

    Ok(())
}

pub async fn test_transaction(conn: &Connection) -> anyhow::Result<()> {
    let schema = Schema::new(conn.clone());
    schema.drop_if_exists("live_accounts").await?;
    schema
        .create("live_accounts", |table| {
            table.id();
            table.string("owner", 64);
        })
        .await?;

    let accounts = QueryBuilder::table("live_accounts");

    let tx = conn.begin().await?;
    accounts.insert(&tx, vec![("owner", "rolled back".into())]).await?;
    tx.rollback().await?;
    assert_eq!(accounts.count(conn).await?, 0);

    let tx = conn.begin().await?;
    accounts.insert(&tx, vec![("owner", "committed".into())]).await?;
    assert_eq!(accounts.count(&tx).await?, 1);
    tx.commit().await?;
    assert_eq!(accounts.count(conn).await?, 1);

    schema.drop("live_accounts").await?;

    Ok(())
}

struct CreateTable(&'static str);

#[async_trait]
impl Migration for CreateTable {
    async fn up(&self, schema: &Schema) -> Result<()> {
        schema
            .create(self.0, |table| {
                table.id();
                table.string("title", 255);
                table.timestamps();
            })
            .await
    }

    async fn down(&self, schema: &Schema) -> Result<()> {
        schema.drop_if_exists(self.0).await
    }
}

pub async fn test_migrations(conn: &Connection) -> anyhow::Result<()> {
    let schema = Schema::new(conn.clone());
    for table in ["migrations", "live_posts", "live_tags"] {
        schema.drop_if_exists(table).await?;
    }

    let mut registry = MigrationRegistry::new();
    registry
        .register("20230615120200_create_live_posts_table", CreateTable("live_posts"))?
        .register("20230615120400_create_live_tags_table", CreateTable("live_tags"))?;

    let migrator = Migrator::new(conn.clone(), registry);

    assert_eq!(migrator.run().await?, 2);
    assert_eq!(migrator.run().await?, 0);
    assert!(migrator.status().await?.iter().all(|s| s.batch == Some(1)));

    let refreshed = migrator.refresh().await?;
    assert_eq!((refreshed.reset, refreshed.ran), (2, 2));

    assert_eq!(migrator.rollback(0).await?, 2);
    assert!(migrator.status().await?.iter().all(|s| !s.is_applied()));
    assert!(conn
        .execute("SELECT * FROM live_posts", Vec::new())
        .await
        .is_err());

    schema.drop("migrations").await?;

    Ok(())
}

/// Opens a connection, retrying while the server refuses or drops
/// connections, for up to 10 seconds.
pub async fn retry_connect_errors(config: &DatabaseConfig) -> Result<Connection> {
    backoff::future::retry(
        backoff::ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::from_secs(10)))
            .build(),
        || {
            Connection::open(config).map_err(|e| -> backoff::Error<Error> {
                if let Error::Connection(
                    ConnectionError::Open { ref source, .. } | ConnectionError::Ping { ref source, .. },
                ) = e
                {
                    if let sqlx::Error::Io(ioe) = source {
                        match ioe.kind() {
                            io::ErrorKind::ConnectionRefused
                            | io::ErrorKind::ConnectionReset
                            | io::ErrorKind::ConnectionAborted => {
                                return backoff::Error::transient(e);
                            }
                            _ => (),
                        }
                    }
                }

                backoff::Error::permanent(e)
            })
        },
    )
    .await
}

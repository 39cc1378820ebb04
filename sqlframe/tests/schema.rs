mod common;

use common::FakeExecutor;
use sqlframe::{Blueprint, Driver, Error, Schema};

#[test]
fn create_table_mysql() {
    let mut table = Blueprint::create("users");
    table.id();
    table.string("name", 255);
    table.string("email", 255).unique();
    table.string("remember_token", 100).nullable();
    table.integer("age", false).unsigned().default(18);
    table.string("role", 20).default("member").comment("user's role");
    table.boolean("active").default(true);
    table.timestamps();
    table.index(["name", "email"]);

    assert_eq!(
        table.to_sql(Driver::MySql).unwrap(),
        vec![
            "CREATE TABLE `users` (\
             `id` BIGINT UNSIGNED NOT NULL AUTO_INCREMENT, \
             `name` VARCHAR(255) NOT NULL, \
             `email` VARCHAR(255) NOT NULL UNIQUE, \
             `remember_token` VARCHAR(100) NULL, \
             `age` INTEGER UNSIGNED NOT NULL DEFAULT 18, \
             `role` VARCHAR(20) NOT NULL DEFAULT 'member' COMMENT 'user''s role', \
             `active` BOOLEAN NOT NULL DEFAULT true, \
             `created_at` TIMESTAMP NULL, \
             `updated_at` TIMESTAMP NULL, \
             PRIMARY KEY (`id`), \
             INDEX `idx_users_name_email` (`name`, `email`)\
             ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci"
        ]
    );
}

#[test]
fn create_table_postgres() {
    let mut table = Blueprint::create("posts");
    table.id();
    table.big_integer("user_id", false).unsigned().index();
    table.string("slug", 255);
    table.text("content").comment("markdown");
    table.decimal("rating", 3, 1).nullable();
    table.json("meta").default(serde_json::json!({"draft": true}));
    table.timestamps_tz();
    table.unique(["slug"]);
    table
        .foreign("user_id")
        .references(["id"])
        .on("users")
        .on_delete("CASCADE");

    assert_eq!(
        table.to_sql(Driver::Postgres).unwrap(),
        vec![
            "CREATE TABLE \"posts\" (\
             \"id\" BIGSERIAL NOT NULL, \
             \"user_id\" BIGINT NOT NULL, \
             \"slug\" VARCHAR(255) NOT NULL, \
             \"content\" TEXT NOT NULL, \
             \"rating\" DECIMAL(3,1) NULL, \
             \"meta\" JSON NOT NULL DEFAULT '{\"draft\":true}', \
             \"created_at\" TIMESTAMPTZ NULL, \
             \"updated_at\" TIMESTAMPTZ NULL, \
             PRIMARY KEY (\"id\"), \
             CONSTRAINT \"unq_posts_slug\" UNIQUE (\"slug\"), \
             CONSTRAINT \"fk_posts_user_id\" FOREIGN KEY (\"user_id\") REFERENCES \"users\" (\"id\") ON DELETE CASCADE\
             )",
            "CREATE INDEX \"idx_posts_user_id\" ON \"posts\" (\"user_id\")",
            "COMMENT ON COLUMN \"posts\".\"content\" IS 'markdown'",
        ]
    );
}

#[test]
fn temporary_and_options() {
    let mut table = Blueprint::create_if_not_exists("cache");
    table.temporary().engine("MEMORY").charset("latin1").collation("latin1_bin");
    table.integer("hits", true);
    table.string("key", 64).unique();
    table.date_time("seen_at").use_current();
    table.primary(["hits"]);

    assert_eq!(
        table.to_sql(Driver::MySql).unwrap(),
        vec![
            "CREATE TEMPORARY TABLE IF NOT EXISTS `cache` (\
             `hits` INTEGER UNSIGNED NOT NULL AUTO_INCREMENT, \
             `key` VARCHAR(64) NOT NULL UNIQUE, \
             `seen_at` TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP, \
             PRIMARY KEY (`hits`)\
             ) ENGINE=MEMORY DEFAULT CHARSET=latin1 COLLATE=latin1_bin"
        ]
    );
}

#[test]
fn create_if_not_exists_guards_postgres_indexes() {
    let mut table = Blueprint::create_if_not_exists("tags");
    table.id();
    table.string("slug", 255).index();

    assert_eq!(
        table.to_sql(Driver::Postgres).unwrap(),
        vec![
            "CREATE TABLE IF NOT EXISTS \"tags\" (\
             \"id\" BIGSERIAL NOT NULL, \
             \"slug\" VARCHAR(255) NOT NULL, \
             PRIMARY KEY (\"id\")\
             )",
            "CREATE INDEX IF NOT EXISTS \"idx_tags_slug\" ON \"tags\" (\"slug\")",
        ]
    );
}

#[test]
fn alter_table_mysql() {
    let mut table = Blueprint::alter("users");
    table.string("nickname", 50).nullable().after("name");
    table.boolean("admin").first();
    table.soft_deletes();
    table.unique(["nickname"]);
    table.drop_column("legacy");
    table.drop_index("idx_users_legacy");

    assert_eq!(
        table.to_sql(Driver::MySql).unwrap(),
        vec![
            "ALTER TABLE `users` \
             ADD COLUMN `nickname` VARCHAR(50) NULL AFTER `name`, \
             ADD COLUMN `admin` BOOLEAN NOT NULL FIRST, \
             ADD COLUMN `deleted_at` TIMESTAMP NULL, \
             ADD UNIQUE INDEX `unq_users_nickname` (`nickname`), \
             DROP COLUMN `legacy`, \
             DROP INDEX `idx_users_legacy`"
        ]
    );
}

#[test]
fn alter_table_postgres_ignores_position() {
    let mut table = Blueprint::alter("users");
    table.string("nickname", 50).nullable().after("name");
    table.index(["nickname"]);
    table.drop_index("idx_users_legacy");

    assert_eq!(
        table.to_sql(Driver::Postgres).unwrap(),
        vec![
            "ALTER TABLE \"users\" ADD COLUMN \"nickname\" VARCHAR(50) NULL",
            "CREATE INDEX \"idx_users_nickname\" ON \"users\" (\"nickname\")",
            "DROP INDEX \"idx_users_legacy\"",
        ]
    );
}

#[test]
fn invalid_blueprints() {
    assert!(matches!(
        Blueprint::create("empty").to_sql(Driver::MySql),
        Err(Error::Builder(_))
    ));

    let mut table = Blueprint::create("comments");
    table.id();
    table.foreign("post_id");

    assert!(matches!(table.to_sql(Driver::MySql), Err(Error::Builder(_))));
    assert!(Blueprint::alter("noop").to_sql(Driver::MySql).unwrap().is_empty());
}

#[tokio::test]
async fn schema_executes_statements() -> anyhow::Result<()> {
    let executor = FakeExecutor::postgres();
    let schema = Schema::new(executor.clone());

    schema
        .create("tags", |table| {
            table.id();
            table.string("slug", 255).index();
        })
        .await?;
    schema.table("tags", |table| table.drop_column("slug")).await?;
    schema.rename("tags", "labels").await?;
    schema.drop("labels").await?;
    schema.drop_if_exists("labels").await?;

    assert_eq!(
        executor.sql(),
        vec![
            "CREATE TABLE \"tags\" (\"id\" BIGSERIAL NOT NULL, \"slug\" VARCHAR(255) NOT NULL, PRIMARY KEY (\"id\"))",
            "CREATE INDEX \"idx_tags_slug\" ON \"tags\" (\"slug\")",
            "ALTER TABLE \"tags\" DROP COLUMN \"slug\"",
            "ALTER TABLE \"tags\" RENAME TO \"labels\"",
            "DROP TABLE \"labels\"",
            "DROP TABLE IF EXISTS \"labels\"",
        ]
    );

    Ok(())
}

mod live;

use sqlframe::{Connection, DatabaseConfig};

async fn connect() -> Connection {
    let config = DatabaseConfig::builder()
        .driver("mysql")
        .host("localhost")
        .port(3306)
        .name("sqlframe_test")
        .user("root")
        .password("root")
        .build();

    live::retry_connect_errors(&config).await.unwrap()
}

#[tokio::test]
#[ignore = "needs a MySQL server on localhost:3306"]
async fn repository() {
    let conn = connect().await;
    live::test_repository(&conn).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a MySQL server on localhost:3306"]
async fn transaction() {
    let conn = connect().await;
    live::test_transaction(&conn).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a MySQL server on localhost:3306"]
async fn migrations() {
    let conn = connect().await;
    live::test_migrations(&conn).await.unwrap();
}

use sqlframe::{async_trait, Migration, Result, Schema};

pub struct CreateUsersTable;

#[async_trait]
impl Migration for CreateUsersTable {
    async fn up(&self, schema: &Schema) -> Result<()> {
        schema
            .create_if_not_exists("users", |table| {
                table.id();
                table.string("name", 255);
                table.string("email", 255).unique();
                table.string("password", 255);
                table.string("remember_token", 100).nullable();
                table.date_time("email_verified_at").nullable();
                super::timestamps(table);
            })
            .await
    }

    async fn down(&self, schema: &Schema) -> Result<()> {
        schema.drop_if_exists("users").await
    }
}

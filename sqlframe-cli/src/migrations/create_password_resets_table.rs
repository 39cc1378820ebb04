use sqlframe::{async_trait, Migration, Result, Schema};

pub struct CreatePasswordResetsTable;

#[async_trait]
impl Migration for CreatePasswordResetsTable {
    async fn up(&self, schema: &Schema) -> Result<()> {
        schema
            .create_if_not_exists("password_resets", |table| {
                table.string("email", 255);
                table.string("token", 255);
                table.date_time("created_at").use_current();
                table.primary(["email", "token"]);
            })
            .await
    }

    async fn down(&self, schema: &Schema) -> Result<()> {
        schema.drop_if_exists("password_resets").await
    }
}

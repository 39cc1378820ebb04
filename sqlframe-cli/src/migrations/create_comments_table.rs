use sqlframe::{async_trait, Migration, Result, Schema};

pub struct CreateCommentsTable;

#[async_trait]
impl Migration for CreateCommentsTable {
    async fn up(&self, schema: &Schema) -> Result<()> {
        schema
            .create_if_not_exists("comments", |table| {
                table.id();
                table.text("content");
                table.big_integer("user_id", false).unsigned().index();
                table.big_integer("post_id", false).unsigned().index();
                table.big_integer("parent_id", false).unsigned().nullable().index();
                super::timestamps(table);

                for (column, parent) in [("user_id", "users"), ("post_id", "posts"), ("parent_id", "comments")] {
                    table.foreign(column).on(parent).on_delete("CASCADE");
                }
            })
            .await
    }

    async fn down(&self, schema: &Schema) -> Result<()> {
        schema.drop_if_exists("comments").await
    }
}

use sqlframe::{async_trait, Migration, Result, Schema};

pub struct CreatePostsTable;

#[async_trait]
impl Migration for CreatePostsTable {
    async fn up(&self, schema: &Schema) -> Result<()> {
        schema
            .create_if_not_exists("posts", |table| {
                table.id();
                table.string("title", 255);
                table.string("slug", 255).unique().index();
                table.text("content");
                table.text("excerpt").nullable();
                table.big_integer("user_id", false).unsigned().index();
                table.boolean("published").default(false).index();
                table.date_time("published_at").nullable();
                super::timestamps(table);
                table.foreign("user_id").on("users").on_delete("CASCADE");
            })
            .await
    }

    async fn down(&self, schema: &Schema) -> Result<()> {
        schema.drop_if_exists("posts").await
    }
}

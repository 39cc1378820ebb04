use sqlframe::{async_trait, Migration, Result, Schema};

/// Tags and the `post_tag` pivot.
pub struct CreateTagsTable;

#[async_trait]
impl Migration for CreateTagsTable {
    async fn up(&self, schema: &Schema) -> Result<()> {
        schema
            .create_if_not_exists("tags", |table| {
                table.id();
                table.string("name", 255).unique();
                table.string("slug", 255).unique().index();
                super::timestamps(table);
            })
            .await?;

        schema
            .create_if_not_exists("post_tag", |table| {
                table.big_integer("post_id", false).unsigned().index();
                table.big_integer("tag_id", false).unsigned().index();
                table.date_time("created_at").use_current();
                table.primary(["post_id", "tag_id"]);
                table.foreign("post_id").on("posts").on_delete("CASCADE");
                table.foreign("tag_id").on("tags").on_delete("CASCADE");
            })
            .await
    }

    async fn down(&self, schema: &Schema) -> Result<()> {
        schema.drop_if_exists("post_tag").await?;
        schema.drop_if_exists("tags").await
    }
}

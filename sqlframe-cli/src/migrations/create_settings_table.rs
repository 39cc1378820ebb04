use std::collections::HashSet;

use sqlframe::{async_trait, Migration, QueryBuilder, Result, Schema};

/// Rows seeded when the settings table is created.
pub const DEFAULT_SETTINGS: [(&str, &str); 10] = [
    ("site_name", "GoFrame Blog"),
    ("site_description", "A blog built with GoFrame"),
    ("site_logo", "/assets/images/logo.png"),
    ("site_favicon", "/assets/images/favicon.ico"),
    ("site_email", "admin@example.com"),
    ("posts_per_page", "10"),
    ("comments_enabled", "true"),
    ("registration_enabled", "true"),
    ("maintenance_mode", "false"),
    ("theme", "default"),
];

pub struct CreateSettingsTable;

#[async_trait]
impl Migration for CreateSettingsTable {
    async fn up(&self, schema: &Schema) -> Result<()> {
        schema
            .create_if_not_exists("settings", |table| {
                table.id();
                table.string("key", 255).unique().index();
                table.text("value").nullable();
                super::timestamps(table);
            })
            .await?;

        // `key` is reserved in MySQL.
        let key = schema.driver().quote("key");
        let settings = QueryBuilder::table("settings");

        // Rows kept from an earlier run of this unit are left untouched.
        let existing = settings
            .clone()
            .select([key.as_str()])
            .where_in(&key, DEFAULT_SETTINGS.map(|(name, _)| name))
            .fetch_rows(schema.executor())
            .await?
            .iter()
            .map(|row| row.try_get::<String>("key"))
            .collect::<std::result::Result<HashSet<_>, _>>()?;

        for (name, value) in DEFAULT_SETTINGS {
            if existing.contains(name) {
                continue;
            }

            settings
                .insert(
                    schema.executor(),
                    vec![(key.as_str(), name.into()), ("value", value.into())],
                )
                .await?;
        }

        tracing::debug!(kept = existing.len(), "seeded default settings");

        Ok(())
    }

    async fn down(&self, schema: &Schema) -> Result<()> {
        schema.drop_if_exists("settings").await
    }
}

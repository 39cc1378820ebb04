//! Migration units shipped with the application.

use sqlframe::{Blueprint, MigrationRegistry, Result};

mod create_comments_table;
mod create_password_resets_table;
mod create_posts_table;
mod create_settings_table;
mod create_tags_table;
mod create_users_table;

pub use create_comments_table::CreateCommentsTable;
pub use create_password_resets_table::CreatePasswordResetsTable;
pub use create_posts_table::CreatePostsTable;
pub use create_settings_table::{CreateSettingsTable, DEFAULT_SETTINGS};
pub use create_tags_table::CreateTagsTable;
pub use create_users_table::CreateUsersTable;

pub fn registry() -> Result<MigrationRegistry> {
    let mut registry = MigrationRegistry::new();

    registry
        .register("20230615120000_create_users_table", CreateUsersTable)?
        .register("20230615120100_create_password_resets_table", CreatePasswordResetsTable)?
        .register("20230615120200_create_posts_table", CreatePostsTable)?
        .register("20230615120300_create_comments_table", CreateCommentsTable)?
        .register("20230615120400_create_tags_table", CreateTagsTable)?
        .register("20230615120500_create_settings_table", CreateSettingsTable)?;

    Ok(registry)
}

/// `created_at` and `updated_at`, both defaulting to the insert time.
fn timestamps(table: &mut Blueprint) {
    table.date_time("created_at").use_current();
    table.date_time("updated_at").use_current();
}

#[cfg(test)]
mod tests {
    use sqlframe::{Blueprint, Driver};

    #[test]
    fn registry_is_ordered() {
        let registry = super::registry().unwrap();

        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec![
                "20230615120000_create_users_table",
                "20230615120100_create_password_resets_table",
                "20230615120200_create_posts_table",
                "20230615120300_create_comments_table",
                "20230615120400_create_tags_table",
                "20230615120500_create_settings_table",
            ]
        );
    }

    #[test]
    fn timestamps_default_to_now() {
        let mut table = Blueprint::create("t");
        super::timestamps(&mut table);

        assert_eq!(
            table.to_sql(Driver::Postgres).unwrap(),
            vec![
                "CREATE TABLE \"t\" (\
                 \"created_at\" TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP, \
                 \"updated_at\" TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP)"
            ]
        );
    }
}

//! Migration commands.

use std::path::Path;

use anyhow::Context;
use clap::Args;
use sqlframe::{Config, Connection, MigrationStatus, Migrator};

use crate::migrations;

#[derive(Debug, Args)]
pub struct RollbackArgs {
    /// Number of batches to roll back, 0 for all of them
    #[arg(long, default_value_t = 0)]
    pub step: usize,
}

async fn migrator(config: &Path) -> anyhow::Result<Migrator> {
    let config = Config::load(config)?;
    let conn = Connection::open(&config.database)
        .await
        .context("failed to connect to database")?;

    Ok(Migrator::new(conn, migrations::registry()?))
}

pub async fn migrate(config: &Path) -> anyhow::Result<()> {
    let ran = migrator(config).await?.run().await?;

    match ran {
        0 => println!("No migrations to run"),
        n => println!("Ran {n} migrations"),
    }

    Ok(())
}

pub async fn rollback(config: &Path, args: RollbackArgs) -> anyhow::Result<()> {
    let reverted = migrator(config).await?.rollback(args.step).await?;

    match reverted {
        0 => println!("No migrations to rollback"),
        n => println!("Rolled back {n} migrations"),
    }

    Ok(())
}

pub async fn reset(config: &Path) -> anyhow::Result<()> {
    let reverted = migrator(config).await?.reset().await?;
    println!("Reset {reverted} migrations");

    Ok(())
}

pub async fn refresh(config: &Path) -> anyhow::Result<()> {
    let refreshed = migrator(config).await?.refresh().await?;
    println!("Refreshed {} migrations", refreshed.ran);

    Ok(())
}

pub async fn status(config: &Path) -> anyhow::Result<()> {
    let status = migrator(config).await?.status().await?;
    print!("{}", render_status(&status));

    Ok(())
}

fn render_status(status: &[MigrationStatus]) -> String {
    let width = status
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(0)
        .max("Migration".len());

    let mut out = format!("{:<width$}  {:>5}  Status\n", "Migration", "Batch");
    for s in status {
        let batch = s.batch.map(|b| b.to_string()).unwrap_or_default();
        let state = match (s.batch, s.registered) {
            (Some(_), true) => "Ran",
            (Some(_), false) => "Missing",
            (None, _) => "Pending",
        };
        out.push_str(&format!("{:<width$}  {:>5}  {state}\n", s.name, batch));
    }

    out
}

#[cfg(test)]
mod tests {
    use sqlframe::MigrationStatus;

    use super::render_status;

    #[test]
    fn status_table() {
        let status = vec![
            MigrationStatus {
                name: "1_create_users_table".to_owned(),
                batch: Some(1),
                registered: true,
            },
            MigrationStatus {
                name: "2_create_posts_table".to_owned(),
                batch: None,
                registered: true,
            },
            MigrationStatus {
                name: "0_removed".to_owned(),
                batch: Some(2),
                registered: false,
            },
        ];

        assert_eq!(
            render_status(&status),
            "Migration             Batch  Status\n\
             1_create_users_table      1  Ran\n\
             2_create_posts_table         Pending\n\
             0_removed                 2  Missing\n"
        );
    }
}

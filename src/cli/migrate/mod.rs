//! Migrate command - manages the PostgreSQL schema

use clap::Args;
use tracing::info;

use crate::infrastructure::storage::{
    connect_pool, storage_migrations, Migrator, PostgresMigrator,
};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Roll back the most recent migration instead of applying pending ones
    #[arg(long)]
    pub revert: bool,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let pool = connect_pool(&config.storage.postgres_config()?).await?;
    let migrator = PostgresMigrator::new(pool, storage_migrations());

    if args.revert {
        match migrator.revert().await? {
            Some(version) => info!(version, "Reverted migration"),
            None => info!("Nothing to revert"),
        }
    } else {
        let applied = migrator.run().await?;
        info!(applied = ?applied, "Migrations complete");
    }

    let version = migrator.version().await?;
    info!(version = ?version, "Current schema version");

    Ok(())
}

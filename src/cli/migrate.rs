use anyhow::{bail, Result};

use crate::db::Database;

pub async fn execute(db: Option<Database>) -> Result<()> {
    let Some(db) = db else {
        bail!("DATABASE_URL is not set; nothing to migrate");
    };

    db.run_migrations().await?;
    println!("Database migrations completed successfully");
    db.close().await;
    Ok(())
}

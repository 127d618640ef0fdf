//! Subcommand handlers.

use crate::ConfigAction;
use ddfduck_core::{ConvertConfig, Database, Summary, metadata};
use std::path::Path;

/// Print the summary of an existing database without modifying it.
pub fn verify(db_path: &Path) -> anyhow::Result<()> {
    if !db_path.exists() {
        anyhow::bail!("Database file not found: {}", db_path.display());
    }

    let db = Database::open_read_only(db_path)?;
    let summary = Summary::collect(&db)?;
    println!("{}", summary);
    match metadata::concept_count(&db)? {
        Some(count) => println!("  Concepts: {}", count),
        None => println!("  Concepts: none ({} missing)", metadata::CONCEPTS_TABLE),
    }
    db.close()?;
    Ok(())
}

pub fn handle_config(action: ConfigAction, config: &ConvertConfig) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_verify_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = verify(&dir.path().join("missing.duckdb")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_verify_existing_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.duckdb");
        {
            let db = Database::open(&path, &ConvertConfig::default().database).unwrap();
            db.execute("CREATE TABLE datapoints_x AS SELECT * FROM range(10)")
                .unwrap();
            db.close().unwrap();
        }
        verify(&path).unwrap();
    }
}

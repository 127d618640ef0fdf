//! Table materialization through DuckDB's auto-detecting CSV reader.
//!
//! Column types are inferred by the engine from a sampled prefix of each file.
//! A group of several files is concatenated with `UNION ALL`, so all members
//! must share a column layout.

use crate::config::ImportConfig;
use crate::database::Database;
use crate::error::{ConvertError, Result};
use crate::naming::{quote_ident, quote_literal};
use std::path::{Path, PathBuf};
use tracing::debug;

/// `read_csv_auto(...)` call for one file.
fn read_csv_expr(file: &Path, sample_size: usize) -> String {
    format!(
        "read_csv_auto({}, header=true, sample_size={})",
        quote_literal(&file.to_string_lossy()),
        sample_size
    )
}

/// `CREATE OR REPLACE TABLE` statement reading a single file.
pub fn single_file_sql(table: &str, file: &Path, sample_size: usize) -> String {
    format!(
        "CREATE OR REPLACE TABLE {} AS SELECT * FROM {}",
        quote_ident(table),
        read_csv_expr(file, sample_size)
    )
}

/// `CREATE OR REPLACE TABLE` statement concatenating several files.
pub fn union_sql(table: &str, files: &[PathBuf], sample_size: usize) -> String {
    let selects: Vec<String> = files
        .iter()
        .map(|f| format!("SELECT * FROM {}", read_csv_expr(f, sample_size)))
        .collect();
    format!(
        "CREATE OR REPLACE TABLE {} AS ({})",
        quote_ident(table),
        selects.join(" UNION ALL ")
    )
}

/// Create (or replace) `table` from `files`.
///
/// One file is read with the single-file sample size; more are unioned, each
/// sampled with the smaller union sample size.
pub fn create_table(
    db: &Database,
    table: &str,
    files: &[PathBuf],
    config: &ImportConfig,
) -> Result<()> {
    let sql = match files {
        [] => return Err(ConvertError::materialize(table, "no source files")),
        [file] => {
            debug!("Creating single-file table: {}", table);
            single_file_sql(table, file, config.single_file_sample_size)
        }
        _ => {
            debug!(
                "Creating union table: {} from {} files",
                table,
                files.len()
            );
            union_sql(table, files, config.union_sample_size)
        }
    };

    db.execute(&sql)
        .map_err(|e| ConvertError::materialize(table, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_file_sql() {
        let sql = single_file_sql(
            "entities_geo",
            Path::new("/data/ddf--entities--geo.csv"),
            1000,
        );
        assert_eq!(
            sql,
            "CREATE OR REPLACE TABLE \"entities_geo\" AS SELECT * FROM \
             read_csv_auto('/data/ddf--entities--geo.csv', header=true, sample_size=1000)"
        );
    }

    #[test]
    fn test_union_sql() {
        let files = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
        let sql = union_sql("datapoints_gdp", &files, 500);
        assert_eq!(
            sql,
            "CREATE OR REPLACE TABLE \"datapoints_gdp\" AS (\
             SELECT * FROM read_csv_auto('a.csv', header=true, sample_size=500) UNION ALL \
             SELECT * FROM read_csv_auto('b.csv', header=true, sample_size=500))"
        );
    }

    #[test]
    fn test_path_quotes_escaped() {
        let sql = single_file_sql("t", Path::new("/data/o'brien.csv"), 10);
        assert!(sql.contains("'/data/o''brien.csv'"));
    }

    #[test]
    fn test_create_table_from_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, "geo,time,gdp\nalb,2000,1.5\nbra,2000,2.5\n").unwrap();
        std::fs::write(&b, "geo,time,gdp\nnzl,2000,3.5\n").unwrap();

        let db = Database::open_in_memory().unwrap();
        let config = ImportConfig::default();

        create_table(&db, "single", std::slice::from_ref(&a), &config).unwrap();
        assert_eq!(db.row_count("single").unwrap(), 2);

        create_table(&db, "both", &[a.clone(), b.clone()], &config).unwrap();
        assert_eq!(db.row_count("both").unwrap(), 3);
        assert_eq!(db.column_names("both").unwrap(), vec!["geo", "time", "gdp"]);
    }

    #[test]
    fn test_create_table_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        let config = ImportConfig::default();

        let err = create_table(&db, "t", &[], &config).unwrap_err();
        assert!(!err.is_fatal());

        let missing = dir.path().join("missing.csv");
        let err = create_table(&db, "t", &[missing], &config).unwrap_err();
        assert!(matches!(err, ConvertError::Materialize { .. }));
    }
}

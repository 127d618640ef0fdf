//! Secondary indexes on common dimension columns.
//!
//! Purely a query-speed nicety: every failure here is swallowed.

use crate::database::Database;
use crate::error::Result;
use crate::naming::{TableKind, quote_ident};
use tracing::{debug, info, warn};

/// Indexes created (and attempts that failed) over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub created: Vec<String>,
    pub failed: usize,
}

/// Deterministic index name for a table/column pair.
pub fn index_name(table: &str, column: &str) -> String {
    format!("idx_{table}_{column}")
}

/// Index every candidate column present in each non-metadata table.
///
/// Only listing the tables can fail; per-table and per-index errors are
/// logged at low level and skipped.
pub fn create_indexes(db: &Database, candidates: &[String]) -> Result<IndexReport> {
    info!("Creating indexes...");
    let mut report = IndexReport::default();

    for table in db.tables()? {
        if TableKind::of(&table) == TableKind::Metadata {
            continue;
        }
        let columns = match db.column_names(&table) {
            Ok(columns) => columns,
            Err(e) => {
                warn!("Could not create indexes for table {}: {}", table, e);
                continue;
            }
        };

        for candidate in candidates.iter().filter(|c| columns.contains(c)) {
            let name = index_name(&table, candidate);
            let sql = format!(
                "CREATE INDEX {} ON {} ({})",
                quote_ident(&name),
                quote_ident(&table),
                quote_ident(candidate)
            );
            match db.execute(&sql) {
                Ok(()) => {
                    debug!("Created index {}", name);
                    report.created.push(name);
                }
                Err(e) => {
                    debug!(index = %name, error = %e, "Index not created");
                    report.failed += 1;
                }
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidates() -> Vec<String> {
        crate::config::ImportConfig::default().index_candidates
    }

    #[test]
    fn test_index_name() {
        assert_eq!(
            index_name("datapoints_gdp_by_geo_time", "geo"),
            "idx_datapoints_gdp_by_geo_time_geo"
        );
    }

    #[test]
    fn test_indexes_on_candidate_columns() {
        let db = Database::open_in_memory().unwrap();
        db.execute("CREATE TABLE datapoints_pop (geo VARCHAR, time INTEGER, pop BIGINT)")
            .unwrap();
        db.execute("CREATE TABLE metadata_concepts (concept VARCHAR, geo VARCHAR)")
            .unwrap();
        db.execute("CREATE TABLE entities_tag (tag VARCHAR)").unwrap();

        let report = create_indexes(&db, &candidates()).unwrap();
        assert_eq!(
            report.created,
            vec!["idx_datapoints_pop_geo", "idx_datapoints_pop_time"]
        );
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn test_existing_index_failure_is_swallowed() {
        let db = Database::open_in_memory().unwrap();
        db.execute("CREATE TABLE datapoints_pop (geo VARCHAR)").unwrap();
        create_indexes(&db, &candidates()).unwrap();

        let again = create_indexes(&db, &candidates()).unwrap();
        assert!(again.created.is_empty());
        assert_eq!(again.failed, 1);
    }
}

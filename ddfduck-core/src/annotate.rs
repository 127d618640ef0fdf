//! Table and column documentation built from the concept dictionary.
//!
//! Comments are attached with DuckDB's `COMMENT ON` statements, so they show
//! up in `duckdb_tables()` / `duckdb_columns()` for anyone exploring the file.

use crate::concepts::{Concept, ConceptDictionary};
use crate::database::Database;
use crate::error::{ConvertError, Result};
use crate::grouping::DatapointSignature;
use crate::naming::{quote_ident, quote_literal};
use tracing::{debug, warn};

/// Table comment for an entity table.
pub fn entity_table_comment(display_name: &str) -> String {
    format!(
        "Entity table for {display_name}. Contains dimensional data used for grouping and filtering datapoints."
    )
}

/// Table comment for a datapoint table.
///
/// Starts from the indicator's display name (or raw id) and appends, each only
/// when non-empty: the dimension list, the concept description (when it
/// differs from the name), and the unit.
pub fn datapoint_table_comment(signature: &DatapointSignature, concepts: &ConceptDictionary) -> String {
    let concept = concepts.get(&signature.indicator);
    let name = concept.map_or(signature.indicator.as_str(), |c| c.name.as_str());

    let mut text = format!("Datapoints for indicator '{name}'");
    if !signature.dimensions.is_empty() {
        text.push_str(&format!(
            " broken down by: {}",
            signature.dimensions.join(", ")
        ));
    }
    if let Some(concept) = concept {
        if !concept.description.is_empty() && concept.description != name {
            text.push_str(&format!(". {}", concept.description));
        }
        if !concept.unit.is_empty() {
            text.push_str(&format!(" Unit: {}", concept.unit));
        }
    }
    text
}

/// Column comment for a concept: `name[. description][ (Unit: unit)]`.
pub fn column_comment(concept: &Concept) -> String {
    let mut text = concept.name.clone();
    if !concept.description.is_empty() && concept.description != concept.name {
        text.push_str(&format!(". {}", concept.description));
    }
    if !concept.unit.is_empty() {
        text.push_str(&format!(" (Unit: {})", concept.unit));
    }
    text
}

pub fn comment_on_table(db: &Database, table: &str, comment: &str) -> Result<()> {
    let sql = format!(
        "COMMENT ON TABLE {} IS {}",
        quote_ident(table),
        quote_literal(comment)
    );
    db.execute(&sql).map_err(|e| ConvertError::Annotate {
        table: table.to_string(),
        message: e.to_string(),
    })
}

pub fn comment_on_column(db: &Database, table: &str, column: &str, comment: &str) -> Result<()> {
    let sql = format!(
        "COMMENT ON COLUMN {}.{} IS {}",
        quote_ident(table),
        quote_ident(column),
        quote_literal(comment)
    );
    db.execute(&sql)
}

/// Outcome of commenting the columns of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnAnnotations {
    /// Columns that received a comment.
    pub commented: Vec<String>,
    /// Columns with a matching concept whose comment was rejected.
    pub failed: Vec<String>,
}

/// Comment every column whose name is a concept identifier.
///
/// Columns without a concept are left alone. A rejected comment is logged
/// and does not stop the remaining columns.
pub fn annotate_columns(
    db: &Database,
    table: &str,
    columns: &[String],
    concepts: &ConceptDictionary,
) -> ColumnAnnotations {
    let mut result = ColumnAnnotations::default();
    for column in columns {
        let Some(concept) = concepts.get(column) else {
            continue;
        };
        match comment_on_column(db, table, column, &column_comment(concept)) {
            Ok(()) => result.commented.push(column.clone()),
            Err(e) => {
                warn!("Could not add comment to column {}.{}: {}", table, column, e);
                result.failed.push(column.clone());
            }
        }
    }
    debug!(
        table = %table,
        commented = result.commented.len(),
        "Column comments applied"
    );
    result
}

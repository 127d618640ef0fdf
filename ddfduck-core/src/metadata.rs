//! Metadata objects: the concept table and the table catalog view.

use crate::annotate::comment_on_table;
use crate::concepts::ConceptDictionary;
use crate::database::Database;
use crate::error::Result;
use crate::naming::{DATAPOINT_PREFIX, ENTITY_PREFIX, METADATA_PREFIX, TableKind, quote_literal};
use tracing::info;

pub const CONCEPTS_TABLE: &str = "metadata_concepts";
pub const TABLES_VIEW: &str = "metadata_tables";

const CONCEPTS_COMMENT: &str =
    "Metadata table containing all concept definitions from the original ddf--concepts.csv file";

/// Write the full concept dictionary to `metadata_concepts`.
///
/// Nothing is created for an empty dictionary. Returns the number of rows.
pub fn create_concepts_table(db: &Database, concepts: &ConceptDictionary) -> Result<usize> {
    if concepts.is_empty() {
        return Ok(0);
    }

    db.execute(&format!(
        "CREATE OR REPLACE TABLE {CONCEPTS_TABLE} (\
         concept VARCHAR, name VARCHAR, concept_type VARCHAR, description VARCHAR, \
         unit VARCHAR, domain VARCHAR, tags VARCHAR)"
    ))?;

    db.execute("BEGIN TRANSACTION")?;
    let inserted = insert_concepts(db, concepts);
    match &inserted {
        Ok(_) => db.execute("COMMIT")?,
        Err(_) => db.execute("ROLLBACK")?,
    }
    let count = inserted?;

    comment_on_table(db, CONCEPTS_TABLE, CONCEPTS_COMMENT)?;
    Ok(count)
}

fn insert_concepts(db: &Database, concepts: &ConceptDictionary) -> Result<usize> {
    let mut stmt = db
        .connection()
        .prepare(&format!("INSERT INTO {CONCEPTS_TABLE} VALUES (?, ?, ?, ?, ?, ?, ?)"))?;
    let mut count = 0;
    for c in concepts.iter() {
        stmt.execute(duckdb::params![
            c.id,
            c.name,
            c.concept_type,
            c.description,
            c.unit,
            c.domain,
            c.tags
        ])?;
        count += 1;
    }
    Ok(count)
}

/// SQL for the `metadata_tables` view, labelling each object by name prefix.
pub fn tables_view_sql() -> String {
    format!(
        "CREATE OR REPLACE VIEW {TABLES_VIEW} AS \
         SELECT table_name, \
         CASE \
         WHEN starts_with(table_name, {entity}) THEN {entity_label} \
         WHEN starts_with(table_name, {datapoint}) THEN {datapoint_label} \
         WHEN starts_with(table_name, {metadata}) THEN {metadata_label} \
         ELSE {other_label} \
         END AS table_type \
         FROM information_schema.tables \
         WHERE table_schema = 'main' \
         ORDER BY table_type, table_name",
        entity = quote_literal(ENTITY_PREFIX),
        datapoint = quote_literal(DATAPOINT_PREFIX),
        metadata = quote_literal(METADATA_PREFIX),
        entity_label = quote_literal(TableKind::Entity.label()),
        datapoint_label = quote_literal(TableKind::Datapoint.label()),
        metadata_label = quote_literal(TableKind::Metadata.label()),
        other_label = quote_literal(TableKind::Other.label()),
    )
}

pub fn create_tables_view(db: &Database) -> Result<()> {
    db.execute(&tables_view_sql())
}

/// Create both metadata objects.
pub fn create_metadata_objects(db: &Database, concepts: &ConceptDictionary) -> Result<()> {
    info!("Creating metadata views...");
    let rows = create_concepts_table(db, concepts)?;
    if rows > 0 {
        info!("Wrote {} concepts to {}", rows, CONCEPTS_TABLE);
    }
    create_tables_view(db)?;
    info!("Created metadata views");
    Ok(())
}

/// Number of rows in `metadata_concepts`, or `None` when it does not exist.
pub fn concept_count(db: &Database) -> Result<Option<u64>> {
    if !db.tables()?.iter().any(|t| t == CONCEPTS_TABLE) {
        return Ok(None);
    }
    Ok(Some(db.row_count(CONCEPTS_TABLE)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::Concept;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_dictionary_creates_nothing() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(create_concepts_table(&db, &ConceptDictionary::new()).unwrap(), 0);
        assert!(db.tables().unwrap().is_empty());
        assert_eq!(concept_count(&db).unwrap(), None);
    }

    #[test]
    fn test_concepts_table_contents() {
        let db = Database::open_in_memory().unwrap();
        let mut dict = ConceptDictionary::new();
        dict.insert(Concept {
            unit: "people".into(),
            ..Concept::bare("population")
        });
        dict.insert(Concept::bare("geo"));

        assert_eq!(create_concepts_table(&db, &dict).unwrap(), 2);
        assert_eq!(concept_count(&db).unwrap(), Some(2));
        assert_eq!(
            db.column_names(CONCEPTS_TABLE).unwrap(),
            vec!["concept", "name", "concept_type", "description", "unit", "domain", "tags"]
        );
        let unit: String = db
            .connection()
            .query_row(
                "SELECT unit FROM metadata_concepts WHERE concept = 'population'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(unit, "people");
        assert_eq!(
            db.table_comment(CONCEPTS_TABLE).unwrap().as_deref(),
            Some(CONCEPTS_COMMENT)
        );
    }

    #[test]
    fn test_tables_view_labels() {
        let db = Database::open_in_memory().unwrap();
        db.execute("CREATE TABLE entities_geo (geo VARCHAR)").unwrap();
        db.execute("CREATE TABLE datapoints_gdp (gdp DOUBLE)").unwrap();
        db.execute("CREATE TABLE scratch (x INTEGER)").unwrap();
        create_tables_view(&db).unwrap();

        let mut stmt = db
            .connection()
            .prepare("SELECT table_name, table_type FROM metadata_tables ORDER BY table_type, table_name")
            .unwrap();
        let rows: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(
            rows,
            vec![
                ("datapoints_gdp".to_string(), "Datapoint Table".to_string()),
                ("entities_geo".to_string(), "Entity Table".to_string()),
                ("metadata_tables".to_string(), "Metadata Table".to_string()),
                ("scratch".to_string(), "Other".to_string()),
            ]
        );
    }
}

//! Conversion pipeline: the linear run from dataset checkout to summary.
//!
//! Stages run strictly in order on one thread:
//!
//! 1. fetch (optional): clone or pull the dataset repository
//! 2. open the output database
//! 3. load the concept dictionary
//! 4. discover and classify files
//! 5. one table per entity type, then one per datapoint group
//! 6. metadata table and view
//! 7. indexes
//! 8. summary
//!
//! Each table is a unit of work with an explicit [`UnitOutcome`]. Per-unit
//! failures are recorded and the run continues; fatal errors (see
//! [`ConvertError::is_fatal`]) end it.

use crate::annotate::{self, ColumnAnnotations};
use crate::concepts::ConceptDictionary;
use crate::config::ConvertConfig;
use crate::database::Database;
use crate::discovery::{self, EntityFile};
use crate::error::{ConvertError, Result};
use crate::fetch;
use crate::grouping::{self, DatapointGroup};
use crate::index::{self, IndexReport};
use crate::materialize;
use crate::metadata;
use crate::naming::{self, TableKind};
use crate::summary::Summary;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// Read-only state shared by every stage of a run.
#[derive(Debug, Clone)]
pub struct ConversionContext {
    pub config: ConvertConfig,
    pub concepts: ConceptDictionary,
}

impl ConversionContext {
    pub fn new(config: ConvertConfig, concepts: ConceptDictionary) -> Self {
        Self { config, concepts }
    }
}

/// A table that was created and documented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: String,
    pub kind: TableKind,
    pub source_files: usize,
    pub rows: u64,
    pub columns: Vec<String>,
    pub annotations: ColumnAnnotations,
}

/// Result of one unit of work.
#[derive(Debug)]
pub enum UnitOutcome {
    Created(TableReport),
    Failed { unit: String, error: ConvertError },
}

/// Everything a completed run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub concepts_loaded: usize,
    pub outcomes: Vec<UnitOutcome>,
    pub indexes: IndexReport,
    pub summary: Option<Summary>,
}

impl RunReport {
    pub fn created(&self) -> impl Iterator<Item = &TableReport> {
        self.outcomes.iter().filter_map(|o| match o {
            UnitOutcome::Created(report) => Some(report),
            UnitOutcome::Failed { .. } => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &ConvertError)> {
        self.outcomes.iter().filter_map(|o| match o {
            UnitOutcome::Failed { unit, error } => Some((unit.as_str(), error)),
            UnitOutcome::Created(_) => None,
        })
    }
}

/// Build the entity table for one entity type.
pub fn build_entity_table(
    ctx: &ConversionContext,
    db: &Database,
    entity: &EntityFile,
) -> Result<TableReport> {
    let table = naming::entity_table_name(&entity.entity_type);
    debug!("Processing entity file: {}", entity.path.display());

    materialize::create_table(
        db,
        &table,
        std::slice::from_ref(&entity.path),
        &ctx.config.import,
    )?;
    let comment = annotate::entity_table_comment(&entity.display_name);
    let report = document_table(ctx, db, &table, TableKind::Entity, 1, &comment)?;

    info!("Created entity table '{}' with {} rows", table, report.rows);
    Ok(report)
}

/// Build the datapoint table for one group of files.
pub fn build_datapoint_table(
    ctx: &ConversionContext,
    db: &Database,
    group: &DatapointGroup,
) -> Result<TableReport> {
    let table = naming::datapoint_table_name(&group.key);

    materialize::create_table(db, &table, &group.files, &ctx.config.import)?;
    let comment = annotate::datapoint_table_comment(&group.signature, &ctx.concepts);
    let report = document_table(
        ctx,
        db,
        &table,
        TableKind::Datapoint,
        group.files.len(),
        &comment,
    )?;

    if group.is_union() {
        info!(
            "Created union datapoint table '{}' with {} rows from {} files",
            table,
            report.rows,
            group.files.len()
        );
    } else {
        info!("Created datapoint table '{}' with {} rows", table, report.rows);
    }
    Ok(report)
}

fn document_table(
    ctx: &ConversionContext,
    db: &Database,
    table: &str,
    kind: TableKind,
    source_files: usize,
    comment: &str,
) -> Result<TableReport> {
    annotate::comment_on_table(db, table, comment)?;
    let columns = db.column_names(table)?;
    let annotations = annotate::annotate_columns(db, table, &columns, &ctx.concepts);
    let rows = db.row_count(table)?;
    Ok(TableReport {
        table: table.to_string(),
        kind,
        source_files,
        rows,
        columns,
        annotations,
    })
}

/// Drives a full conversion run.
pub struct Converter {
    config: ConvertConfig,
    interrupt: Arc<AtomicBool>,
}

impl Converter {
    pub fn new(config: ConvertConfig) -> Self {
        Self {
            config,
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use an externally owned interrupt flag (set by a signal handler).
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    fn check_interrupt(&self) -> Result<()> {
        if self.interrupt.load(Ordering::SeqCst) {
            Err(ConvertError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Run every stage. The database connection is released on all paths.
    pub fn run(&self) -> Result<RunReport> {
        info!("Starting DDF to DuckDB conversion...");
        let source = &self.config.source;

        if source.fetch {
            fetch::require_tool("git")?;
            fetch::clone_or_update(&source.repo_path, &source.repo_url)?;
        }
        self.check_interrupt()?;

        let db = Database::open(&self.config.database.output_path, &self.config.database)?;
        let report = self.run_with(&db)?;
        db.close()?;

        info!(
            "Conversion completed successfully! Database saved to: {}",
            self.config.database.output_path.display()
        );
        Ok(report)
    }

    /// Run the stages after the database is open.
    pub fn run_with(&self, db: &Database) -> Result<RunReport> {
        let concepts = ConceptDictionary::load(&self.config.source.concepts_path());
        let ctx = ConversionContext::new(self.config.clone(), concepts);
        let mut report = RunReport {
            concepts_loaded: ctx.concepts.len(),
            ..RunReport::default()
        };

        let found = discovery::discover(&ctx.config.source.repo_path, &ctx.config.source)?;
        let mut claimed: HashMap<String, String> = HashMap::new();

        info!("Creating entity tables...");
        for entity in found.entities.values() {
            self.check_interrupt()?;
            let unit = format!("entity {}", entity.entity_type);
            let table = naming::entity_table_name(&entity.entity_type);
            note_collision(&mut claimed, &table, &unit);
            let result = build_entity_table(&ctx, db, entity);
            record(&mut report.outcomes, unit, result)?;
        }

        info!("Creating datapoint tables...");
        for group in grouping::group_datapoints(&found.datapoints) {
            self.check_interrupt()?;
            let unit = format!("datapoints {}", group.key);
            let table = naming::datapoint_table_name(&group.key);
            note_collision(&mut claimed, &table, &unit);
            let result = build_datapoint_table(&ctx, db, &group);
            record(&mut report.outcomes, unit, result)?;
        }

        self.check_interrupt()?;
        if let Err(e) = metadata::create_metadata_objects(db, &ctx.concepts) {
            error!("Error creating metadata views: {}", e);
        }

        self.check_interrupt()?;
        match index::create_indexes(db, &ctx.config.import.index_candidates) {
            Ok(indexes) => report.indexes = indexes,
            Err(e) => error!("Error creating indexes: {}", e),
        }

        match Summary::collect(db) {
            Ok(summary) => {
                for line in summary.to_string().lines() {
                    info!("{}", line);
                }
                report.summary = Some(summary);
            }
            Err(e) => error!("Error generating summary: {}", e),
        }

        Ok(report)
    }
}

/// Record a unit's result, propagating only fatal errors.
fn record(
    outcomes: &mut Vec<UnitOutcome>,
    unit: String,
    result: Result<TableReport>,
) -> Result<()> {
    match result {
        Ok(report) => outcomes.push(UnitOutcome::Created(report)),
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            error!("Error creating table for {}: {}", unit, e);
            outcomes.push(UnitOutcome::Failed { unit, error: e });
        }
    }
    Ok(())
}

/// Warn when two units of the same run map to one table name. The later
/// unit still replaces the earlier table.
fn note_collision(claimed: &mut HashMap<String, String>, table: &str, unit: &str) {
    if let Some(previous) = claimed.insert(table.to_string(), unit.to_string()) {
        warn!(
            table = %table,
            previous = %previous,
            current = %unit,
            "Table name collision, the later unit replaces the earlier table"
        );
    }
}

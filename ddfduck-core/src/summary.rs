//! End-of-run summary: table counts by category, total rows, file size.

use crate::database::Database;
use crate::error::Result;
use crate::naming::TableKind;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Tables and views in schema `main`, by category.
    pub counts: BTreeMap<TableKind, usize>,
    /// Sum of row counts over all non-metadata objects.
    pub total_rows: u64,
    /// Database file size in bytes, when file-backed.
    pub size_bytes: Option<u64>,
}

impl Summary {
    /// Gather the summary from the live database.
    ///
    /// Objects whose row count cannot be read are left out of the total.
    pub fn collect(db: &Database) -> Result<Self> {
        let mut summary = Self::default();
        for name in db.relations()? {
            let kind = TableKind::of(&name);
            *summary.counts.entry(kind).or_default() += 1;
            if kind != TableKind::Metadata
                && let Ok(rows) = db.row_count(&name)
            {
                summary.total_rows += rows;
            }
        }
        summary.size_bytes = db.file_size();
        Ok(summary)
    }

    pub fn count(&self, kind: TableKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn size_mb(&self) -> Option<f64> {
        self.size_bytes.map(|b| b as f64 / (1024.0 * 1024.0))
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Database creation summary:")?;
        for (kind, count) in &self.counts {
            writeln!(f, "  {}: {}", kind, count)?;
        }
        write!(f, "  Total data rows: {}", group_thousands(self.total_rows))?;
        if let Some(mb) = self.size_mb() {
            write!(f, "\n  Database size: {:.1} MB", mb)?;
        }
        Ok(())
    }
}

/// `1234567` → `1,234,567`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

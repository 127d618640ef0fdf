//! Datapoint filename parsing and grouping.
//!
//! The DDF naming convention encodes a datapoint file's schema in its name:
//! `ddf--datapoints--<indicator>--by--<dim1>--<dim2>.csv`. The upstream
//! dataset splits some indicators across several files (for example one per
//! continent), so files sharing an indicator and an ordered dimension list are
//! grouped and later unioned into a single table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const FIELD_SEPARATOR: &str = "--";
const BY_MARKER: &str = "by";

/// Indicator and ordered dimension list parsed from a datapoint filename.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatapointSignature {
    pub indicator: String,
    pub dimensions: Vec<String>,
}

impl DatapointSignature {
    /// Grouping key: `indicator_by_dim1_dim2`, or the bare indicator.
    ///
    /// Dimension order is significant.
    pub fn group_key(&self) -> String {
        if self.dimensions.is_empty() {
            self.indicator.clone()
        } else {
            format!("{}_by_{}", self.indicator, self.dimensions.join("_"))
        }
    }
}

/// Parse a datapoint file name into its signature.
///
/// The `.csv` extension is stripped and the rest split on `--`. When the first
/// two fields are not `ddf` and `datapoints`, the whole stem becomes the
/// indicator with no dimensions. A missing `by` field also means no
/// dimensions.
pub fn parse_datapoint_filename(filename: &str) -> DatapointSignature {
    let stem = strip_extension(filename);
    let parts: Vec<&str> = stem.split(FIELD_SEPARATOR).collect();

    if parts.len() >= 3 && parts[0] == "ddf" && parts[1] == "datapoints" {
        let dimensions = parts
            .iter()
            .position(|p| *p == BY_MARKER)
            .map(|by| parts[by + 1..].iter().map(|d| d.to_string()).collect())
            .unwrap_or_default();
        return DatapointSignature {
            indicator: parts[2].to_string(),
            dimensions,
        };
    }

    DatapointSignature {
        indicator: stem.to_string(),
        dimensions: Vec::new(),
    }
}

fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => &filename[..dot],
        _ => filename,
    }
}

/// Datapoint files that share one signature and become one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatapointGroup {
    pub key: String,
    pub signature: DatapointSignature,
    pub files: Vec<PathBuf>,
}

impl DatapointGroup {
    pub fn is_union(&self) -> bool {
        self.files.len() > 1
    }
}

/// Group datapoint files by signature, ordered by group key.
///
/// Membership is decided from file names only; file contents are never read.
/// Within a group, files keep the order they were given in.
pub fn group_datapoints<P: AsRef<Path>>(files: &[P]) -> Vec<DatapointGroup> {
    let mut groups: BTreeMap<String, DatapointGroup> = BTreeMap::new();

    for file in files {
        let path = file.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let signature = parse_datapoint_filename(&filename);
        let key = signature.group_key();

        groups
            .entry(key.clone())
            .or_insert_with(|| DatapointGroup {
                key,
                signature,
                files: Vec::new(),
            })
            .files
            .push(path.to_path_buf());
    }

    groups.into_values().collect()
}

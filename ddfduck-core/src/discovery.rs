//! File discovery and classification for DDF-CSV repositories.
//!
//! Walks the dataset tree and sorts every tabular file into one of the DDF
//! roles by filename alone:
//!
//! - `ddf--concepts.<ext>`: the concept dictionary, loaded separately
//! - `ddf--entities--<entity_type>.<ext>`: one entity table per type
//! - `ddf--datapoints--...`: collected for the grouping step
//!
//! Translated copies (filenames containing a language marker such as `--zh`)
//! and anything else are ignored.

use crate::config::SourceConfig;
use crate::error::{ConvertError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const ENTITY_FILE_PREFIX: &str = "ddf--entities";
const DATAPOINT_FILE_PREFIX: &str = "ddf--datapoints";

/// An entity file, one per entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityFile {
    pub entity_type: String,
    pub path: PathBuf,
    pub display_name: String,
}

/// Role of a file as decided by its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileClass {
    /// Filename carries a non-primary-language marker.
    Excluded,
    /// The concept dictionary itself.
    Concepts,
    /// Entity file with the extracted entity type.
    Entity(String),
    /// Entity prefix matched but no entity type could be extracted.
    MalformedEntity,
    Datapoint,
    Unrecognized,
}

/// Filename classifier built from the source configuration.
#[derive(Debug, Clone)]
pub struct Classifier {
    concepts_file: String,
    excluded_markers: Vec<String>,
    extension: String,
    entity_pattern: Regex,
}

impl Classifier {
    pub fn new(config: &SourceConfig) -> Self {
        let pattern = format!(
            r"^{}--(.+)\.{}$",
            regex::escape(ENTITY_FILE_PREFIX),
            regex::escape(&config.extension)
        );
        Self {
            concepts_file: config.concepts_file.clone(),
            excluded_markers: config.excluded_markers.clone(),
            extension: config.extension.clone(),
            entity_pattern: Regex::new(&pattern).expect("entity pattern built from escaped parts"),
        }
    }

    /// Classify a bare file name (no directory part).
    pub fn classify(&self, filename: &str) -> FileClass {
        if self
            .excluded_markers
            .iter()
            .any(|marker| filename.contains(marker.as_str()))
        {
            return FileClass::Excluded;
        }
        if filename == self.concepts_file {
            return FileClass::Concepts;
        }
        if filename.starts_with(ENTITY_FILE_PREFIX) {
            return match self.extract_entity_type(filename) {
                Some(entity_type) => FileClass::Entity(entity_type),
                None => FileClass::MalformedEntity,
            };
        }
        if filename.starts_with(DATAPOINT_FILE_PREFIX) {
            return FileClass::Datapoint;
        }
        FileClass::Unrecognized
    }

    /// Extract `<entity_type>` from `ddf--entities--<entity_type>.<ext>`.
    pub fn extract_entity_type(&self, filename: &str) -> Option<String> {
        self.entity_pattern
            .captures(filename)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
    }
}

/// Result of walking a dataset tree.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredFiles {
    /// Entity files keyed by entity type.
    pub entities: BTreeMap<String, EntityFile>,
    /// Datapoint files, in walk order.
    pub datapoints: Vec<PathBuf>,
}

/// Walk `root` recursively and classify every tabular file.
///
/// Files are visited in file-name order so repeated runs see the same
/// sequence. Hidden directories such as `.git` are not descended into.
pub fn discover(root: &Path, config: &SourceConfig) -> Result<DiscoveredFiles> {
    if !root.is_dir() {
        return Err(ConvertError::Discovery {
            message: format!("source directory not found: {}", root.display()),
        });
    }

    info!("Discovering DDF files...");
    let classifier = Classifier::new(config);
    let mut found = DiscoveredFiles::default();

    let walker = walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || !classifier.has_extension(entry.path()) {
            continue;
        }
        let filename = entry.file_name().to_string_lossy();

        match classifier.classify(&filename) {
            FileClass::Entity(entity_type) => {
                let record = EntityFile {
                    display_name: display_name(&entity_type),
                    path: entry.path().to_path_buf(),
                    entity_type: entity_type.clone(),
                };
                if let Some(previous) = found.entities.insert(entity_type.clone(), record) {
                    warn!(
                        entity_type = %entity_type,
                        replaced = %previous.path.display(),
                        "Duplicate entity file, keeping the later one"
                    );
                }
            }
            FileClass::Datapoint => found.datapoints.push(entry.path().to_path_buf()),
            FileClass::MalformedEntity => {
                debug!(file = %filename, "Entity file without entity type, skipping");
            }
            FileClass::Excluded | FileClass::Concepts | FileClass::Unrecognized => {}
        }
    }

    info!("Found {} entity files", found.entities.len());
    info!("Found {} datapoint files", found.datapoints.len());
    Ok(found)
}

/// Human-readable name for an entity type: underscores become spaces and
/// each word is title-cased (`world_4region` → `World 4Region`).
pub fn display_name(entity_type: &str) -> String {
    let mut out = String::with_capacity(entity_type.len());
    let mut in_word = false;
    for c in entity_type.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classifier() -> Classifier {
        Classifier::new(&SourceConfig::default())
    }

    #[test]
    fn test_extract_entity_type() {
        let c = classifier();
        assert_eq!(
            c.extract_entity_type("ddf--entities--geo.csv").as_deref(),
            Some("geo")
        );
        assert_eq!(
            c.extract_entity_type("ddf--entities--geo--Country.csv").as_deref(),
            Some("geo--Country")
        );
        assert_eq!(c.extract_entity_type("ddf--entities.csv"), None);
        assert_eq!(c.extract_entity_type("ddf--entities--.csv"), None);
    }

    #[test]
    fn test_classify() {
        let c = classifier();
        assert_eq!(c.classify("ddf--concepts.csv"), FileClass::Concepts);
        assert_eq!(
            c.classify("ddf--entities--geo--country.csv"),
            FileClass::Entity("geo--country".into())
        );
        assert_eq!(c.classify("ddf--entities.csv"), FileClass::MalformedEntity);
        assert_eq!(
            c.classify("ddf--datapoints--gdp--by--geo--time.csv"),
            FileClass::Datapoint
        );
        assert_eq!(c.classify("README.csv"), FileClass::Unrecognized);
        assert_eq!(
            c.classify("ddf--datapoints--gdp--by--geo--time--zh.csv"),
            FileClass::Excluded
        );
        assert_eq!(
            c.classify("ddf--entities--geo--country--fr.csv"),
            FileClass::Excluded
        );
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("geo"), "Geo");
        assert_eq!(display_name("world_4region"), "World 4Region");
        assert_eq!(display_name("income_groups"), "Income Groups");
        assert_eq!(display_name("geo--country"), "Geo--Country");
        assert_eq!(display_name("UN_STATE"), "Un State");
    }

    #[test]
    fn test_discover_tree() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        let countries = root.join("countries-etc-datapoints");
        std::fs::create_dir_all(&countries).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();

        for name in [
            "ddf--concepts.csv",
            "ddf--entities--geo--country.csv",
            "ddf--entities--tag.csv",
            "ddf--entities.csv",
            "ddf--entities--geo--country--zh.csv",
            "notes.txt",
            "other.csv",
        ] {
            std::fs::write(root.join(name), "a,b\n1,2\n").unwrap();
        }
        std::fs::write(
            countries.join("ddf--datapoints--pop--by--geo--time.csv"),
            "geo,time,pop\n",
        )
        .unwrap();
        std::fs::write(root.join(".git").join("ddf--datapoints--x.csv"), "").unwrap();

        let found = discover(root, &SourceConfig::default()).unwrap();
        let types: Vec<&str> = found.entities.keys().map(String::as_str).collect();
        assert_eq!(types, vec!["geo--country", "tag"]);
        assert_eq!(found.entities["tag"].display_name, "Tag");
        assert_eq!(found.datapoints.len(), 1);
        assert!(found.datapoints[0].ends_with("ddf--datapoints--pop--by--geo--time.csv"));
    }

    #[test]
    fn test_discover_missing_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = discover(&dir.path().join("absent"), &SourceConfig::default()).unwrap_err();
        assert!(err.is_fatal());
    }
}

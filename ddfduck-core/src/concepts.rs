//! Concept dictionary: documented variables and dimensions of a DDF dataset.
//!
//! Loaded once from `ddf--concepts.csv` and consulted read-only when tables
//! and columns are annotated. A missing or unreadable file yields an empty
//! dictionary: concepts only enrich the output.

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// A single concept definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub name: String,
    pub concept_type: String,
    pub description: String,
    pub unit: String,
    pub domain: String,
    pub tags: String,
}

impl Concept {
    /// A concept with only an identifier; the display name falls back to it.
    pub fn bare(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            concept_type: String::new(),
            description: String::new(),
            unit: String::new(),
            domain: String::new(),
            tags: String::new(),
        }
    }
}

/// Mapping from concept identifier to its definition, ordered by identifier.
#[derive(Debug, Clone, Default)]
pub struct ConceptDictionary {
    concepts: BTreeMap<String, Concept>,
}

impl ConceptDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the dictionary, logging and returning an empty one on any failure.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!(path = %path.display(), "Concepts file not found");
            return Self::new();
        }
        info!("Loading concepts...");
        match Self::try_load(path) {
            Ok(dict) => {
                info!("Loaded {} concepts", dict.len());
                dict
            }
            Err(e) => {
                tracing::error!("Error loading concepts: {}", e);
                Self::new()
            }
        }
    }

    /// Load the dictionary from a file, surfacing read and parse errors.
    pub fn try_load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file).map_err(|e| ConvertError::Concepts {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse a concepts table from any reader.
    ///
    /// Header names are trimmed. Rows whose trimmed `concept` is empty are
    /// skipped; a later row with the same identifier replaces an earlier one.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let Some(concept_idx) = position("concept") else {
            return Err(ConvertError::Csv(csv::Error::from(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "concepts file has no 'concept' column",
            ))));
        };
        let name_idx = position("name");
        let type_idx = position("concept_type");
        let desc_idx = position("description");
        let unit_idx = position("unit");
        let domain_idx = position("domain");
        let tags_idx = position("tags");

        let mut concepts = BTreeMap::new();
        for record in csv_reader.records() {
            let record = record?;
            let field = |idx: Option<usize>| {
                idx.and_then(|i| record.get(i))
                    .unwrap_or_default()
                    .to_string()
            };

            let id = record.get(concept_idx).unwrap_or_default().trim();
            if id.is_empty() {
                continue;
            }

            let name = field(name_idx);
            let concept = Concept {
                id: id.to_string(),
                name: if name.is_empty() { id.to_string() } else { name },
                concept_type: field(type_idx),
                description: field(desc_idx),
                unit: field(unit_idx),
                domain: field(domain_idx),
                tags: field(tags_idx),
            };
            concepts.insert(concept.id.clone(), concept);
        }

        Ok(Self { concepts })
    }

    pub fn insert(&mut self, concept: Concept) {
        self.concepts.insert(concept.id.clone(), concept);
    }

    pub fn get(&self, id: &str) -> Option<&Concept> {
        self.concepts.get(id)
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Iterate concepts in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.values()
    }
}

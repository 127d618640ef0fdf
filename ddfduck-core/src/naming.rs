//! Table naming and SQL text escaping.

use std::fmt;

pub const ENTITY_PREFIX: &str = "entities_";
pub const DATAPOINT_PREFIX: &str = "datapoints_";
pub const METADATA_PREFIX: &str = "metadata_";

/// Map every character outside `[A-Za-z0-9_]` to `_` and prefix `t_` when
/// the result would start with a digit.
///
/// Applying it twice yields the same name.
pub fn sanitize_table_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        format!("t_{sanitized}")
    } else {
        sanitized
    }
}

pub fn entity_table_name(entity_type: &str) -> String {
    format!("{ENTITY_PREFIX}{}", sanitize_table_name(entity_type))
}

pub fn datapoint_table_name(group_key: &str) -> String {
    format!("{DATAPOINT_PREFIX}{}", sanitize_table_name(group_key))
}

/// Double every single quote so `text` can sit inside a `'...'` literal.
pub fn escape_literal(text: &str) -> String {
    text.replace('\'', "''")
}

/// Render `text` as a single-quoted SQL string literal.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", escape_literal(text))
}

/// Render `ident` as a double-quoted SQL identifier.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Category of a table in the output database, derived from its name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableKind {
    Datapoint,
    Entity,
    Metadata,
    Other,
}

impl TableKind {
    pub fn of(table_name: &str) -> Self {
        if table_name.starts_with(ENTITY_PREFIX) {
            Self::Entity
        } else if table_name.starts_with(DATAPOINT_PREFIX) {
            Self::Datapoint
        } else if table_name.starts_with(METADATA_PREFIX) {
            Self::Metadata
        } else {
            Self::Other
        }
    }

    /// Singular label stored in the `metadata_tables` view.
    pub fn label(self) -> &'static str {
        match self {
            Self::Entity => "Entity Table",
            Self::Datapoint => "Datapoint Table",
            Self::Metadata => "Metadata Table",
            Self::Other => "Other",
        }
    }

    /// Plural label used in the run summary.
    pub fn plural_label(self) -> &'static str {
        match self {
            Self::Entity => "Entity Tables",
            Self::Datapoint => "Datapoint Tables",
            Self::Metadata => "Metadata Tables",
            Self::Other => "Other Tables",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural_label())
    }
}

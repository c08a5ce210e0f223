//! Report configuration: which column is the parcel identifier and which
//! columns back each assessment category.
//!
//! Everything defaults to the RCW 87.84 rehabilitation layout, so a config
//! file only needs the fields it wants to override:
//!
//! ```json
//! { "identifier_width": 10, "categories": [ { "label": "Res", "column": "RES" } ] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QcError, Result};

pub const DEFAULT_IDENTIFIER_COLUMN: &str = "PARCEL";
pub const DEFAULT_IDENTIFIER_WIDTH: usize = 9;

/// Filter label that selects every row.
pub const ALL_LABEL: &str = "All";

const DEFAULT_CATEGORIES: [(&str, &str); 6] = [
    ("Residential Waterfront", "RES Waterfront Point Comp. to Col. BU"),
    ("Commercial Waterfront", "COM Waterfront Point Comp. to Col. BU"),
    ("Parks Waterfront", "PARKS Waterfront Point Comp. to Col. BU"),
    ("Residential Non-Waterfront", "RES NON-Waterfront Point Comp. to Col. BU"),
    ("Commercial Non-Waterfront", "COM NON-Waterfront Point Comp. to Col. BU"),
    ("Farms Non-Waterfront", "FARMS NON-Waterfront Point Comp. to Col. BU"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub column: String,
}

impl Category {
    pub fn new(label: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            column: column.into(),
        }
    }
}

/// Ordered label → column table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMap(Vec<Category>);

impl CategoryMap {
    pub fn new(categories: Vec<Category>) -> Self {
        Self(categories)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Category> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn column_for(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.column.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|c| c.label.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|c| c.column.as_str())
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self(
            DEFAULT_CATEGORIES
                .iter()
                .map(|(label, column)| Category::new(*label, *column))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a CategoryMap {
    type Item = &'a Category;
    type IntoIter = std::slice::Iter<'a, Category>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub identifier_column: String,
    pub identifier_width: usize,
    pub categories: CategoryMap,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            identifier_column: DEFAULT_IDENTIFIER_COLUMN.to_string(),
            identifier_width: DEFAULT_IDENTIFIER_WIDTH,
            categories: CategoryMap::default(),
        }
    }
}

impl ReportConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| QcError::io(path, e))?;
        let config: ReportConfig =
            serde_json::from_str(&text).map_err(|source| QcError::Config {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(
            path = %path.display(),
            categories = config.categories.len(),
            "loaded report config"
        );
        Ok(config)
    }

    /// Loads `path` when given, otherwise the built-in layout.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_map_has_six_categories_in_order() {
        let map = CategoryMap::default();
        let labels: Vec<&str> = map.labels().collect();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], "Residential Waterfront");
        assert_eq!(labels[5], "Farms Non-Waterfront");
        assert_eq!(
            map.column_for("Parks Waterfront"),
            Some("PARKS Waterfront Point Comp. to Col. BU")
        );
        assert_eq!(map.column_for(ALL_LABEL), None);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, r#"{{"identifier_width": 12}}"#).unwrap();

        let config = ReportConfig::from_path(tmp.path()).unwrap();
        assert_eq!(config.identifier_width, 12);
        assert_eq!(config.identifier_column, "PARCEL");
        assert_eq!(config.categories, CategoryMap::default());
    }

    #[test]
    fn custom_categories_replace_the_table() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{"categories": [{{"label": "Orchards", "column": "ORCH"}}]}}"#
        )
        .unwrap();

        let config = ReportConfig::from_path(tmp.path()).unwrap();
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.categories.column_for("Orchards"), Some("ORCH"));
    }

    #[test]
    fn malformed_config_is_reported() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "{{ not json").unwrap();

        let err = ReportConfig::from_path(tmp.path()).unwrap_err();
        assert!(matches!(err, QcError::Config { .. }));
    }
}

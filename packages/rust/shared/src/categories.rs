//! Category definition input: group label → ordered category identifiers.
//!
//! The input file is a JSON object such as
//! `{"Bronzezeit": ["Kategorie:Bronzezeit_(Alter_Orient)", "Kategorie:Hethiter"]}`.
//! Key order is preserved; it decides which group wins when the same article
//! is reachable from several groups.

use std::fmt;
use std::path::Path;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::error::{CorpusError, Result};

/// A group label with the categories harvested under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    /// User-chosen corpus partition name.
    pub label: String,
    /// Exact remote category keys, in input order.
    pub categories: Vec<String>,
}

/// All groups of one run, in input order. Labels are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryGroups {
    groups: Vec<CategoryGroup>,
}

impl CategoryGroups {
    /// Build from already-constructed groups, rejecting duplicate labels.
    pub fn new(groups: Vec<CategoryGroup>) -> Result<Self> {
        for (i, group) in groups.iter().enumerate() {
            if groups[..i].iter().any(|g| g.label == group.label) {
                return Err(CorpusError::config(format!(
                    "duplicate group label '{}'",
                    group.label
                )));
            }
        }
        Ok(Self { groups })
    }

    /// Parse the JSON category definition.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| CorpusError::config(format!("invalid category file: {e}")))
    }

    /// Iterate over groups in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, CategoryGroup> {
        self.groups.iter()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups at all.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of category identifiers across all groups.
    pub fn category_count(&self) -> usize {
        self.groups.iter().map(|g| g.categories.len()).sum()
    }
}

impl<'a> IntoIterator for &'a CategoryGroups {
    type Item = &'a CategoryGroup;
    type IntoIter = std::slice::Iter<'a, CategoryGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'de> Deserialize<'de> for CategoryGroups {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = CategoryGroups;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping from group label to a list of category identifiers")
            }

            fn visit_map<M>(self, mut map: M) -> std::result::Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut groups: Vec<CategoryGroup> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));

                while let Some((label, categories)) = map.next_entry::<String, Vec<String>>()? {
                    groups.push(CategoryGroup { label, categories });
                }

                CategoryGroups::new(groups).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

/// Load the category definition file.
///
/// Any read or parse failure is a [`CorpusError::Config`]: nothing has been
/// fetched yet, so the run aborts immediately.
pub fn load_category_groups(path: &Path) -> Result<CategoryGroups> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CorpusError::config(format!("cannot read category file {}: {e}", path.display()))
    })?;

    let groups = CategoryGroups::from_json_str(&content)?;

    tracing::info!(
        path = %path.display(),
        groups = groups.len(),
        categories = groups.category_count(),
        "loaded category definitions"
    );

    Ok(groups)
}

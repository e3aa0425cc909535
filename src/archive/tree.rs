//! In-memory group tree of the archive.
//!
//! Groups nest by name; each group also holds named datasets. Groups are
//! get-or-create, datasets are create-once.

use crate::errors::ArchiveError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Element type tag stored with every dataset.
pub const UTF8_DTYPE: &str = "utf-8";

/// A leaf dataset: an ordered sequence of UTF-8 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub dtype: String,
    pub values: Vec<String>,
}

impl Dataset {
    pub fn utf8(values: Vec<String>) -> Self {
        Self {
            dtype: UTF8_DTYPE.to_string(),
            values,
        }
    }
}

/// A named group holding child groups and datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<String, Group>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub datasets: BTreeMap<String, Dataset>,
}

impl Group {
    fn count_datasets(&self) -> usize {
        self.datasets.len()
            + self
                .groups
                .values()
                .map(Group::count_datasets)
                .sum::<usize>()
    }

    fn collect_datasets<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Dataset)>) {
        for (name, dataset) in &self.datasets {
            out.push((join(prefix, name), dataset));
        }
        for (name, group) in &self.groups {
            group.collect_datasets(&join(prefix, name), out);
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

fn validate_name(name: &str) -> Result<(), ArchiveError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(ArchiveError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// A hierarchical archive rooted at an unnamed group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub(crate) root: Group,
    pub(crate) created_at: DateTime<Utc>,
}

impl Default for Archive {
    fn default() -> Self {
        Self::new()
    }
}

impl Archive {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self {
            root: Group::default(),
            created_at: Utc::now(),
        }
    }

    /// When the archive was first created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The root group.
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Get the group at `path`, creating any missing groups along the way.
    pub fn require_group<S: AsRef<str>>(&mut self, path: &[S]) -> Result<&mut Group, ArchiveError> {
        let mut group = &mut self.root;
        let mut walked = String::new();

        for segment in path {
            let name = segment.as_ref();
            validate_name(name)?;
            walked = join(&walked, name);

            if group.datasets.contains_key(name) {
                return Err(ArchiveError::NotAGroup { path: walked });
            }
            group = group.groups.entry(name.to_string()).or_default();
        }

        Ok(group)
    }

    /// Create dataset `name` in the group at `path`.
    ///
    /// Fails if the group already holds a dataset or a child group of that name.
    pub fn create_dataset<S: AsRef<str>>(
        &mut self,
        path: &[S],
        name: &str,
        values: Vec<String>,
    ) -> Result<&Dataset, ArchiveError> {
        validate_name(name)?;
        let group_label = path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("/");
        let group = self.require_group(path)?;

        if group.groups.contains_key(name) {
            return Err(ArchiveError::NameIsGroup {
                group: group_label,
                name: name.to_string(),
            });
        }
        if group.datasets.contains_key(name) {
            return Err(ArchiveError::DuplicateDataset {
                group: group_label,
                name: name.to_string(),
            });
        }

        let dataset: &Dataset = group
            .datasets
            .entry(name.to_string())
            .or_insert_with(|| Dataset::utf8(values));
        Ok(dataset)
    }

    /// Look up a group by slash-separated path. The empty path is the root.
    pub fn group(&self, path: &str) -> Option<&Group> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(&self.root, |group, name| group.groups.get(name))
    }

    /// Look up a dataset by slash-separated path, e.g. `0.5/square/.../42/Z`.
    pub fn dataset(&self, path: &str) -> Option<&Dataset> {
        let (parent, name) = match path.rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", path),
        };
        self.group(parent)?.datasets.get(name)
    }

    /// Total number of datasets in the archive.
    pub fn dataset_count(&self) -> usize {
        self.root.count_datasets()
    }

    /// All datasets with their full paths, in path order per group level.
    pub fn datasets(&self) -> Vec<(String, &Dataset)> {
        let mut out = Vec::new();
        self.root.collect_datasets("", &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_require_group_is_idempotent() {
        let mut archive = Archive::new();
        archive.require_group(&["a", "b", "c"]).unwrap();
        archive.require_group(&["a", "b", "d"]).unwrap();
        archive.require_group(&["a", "b", "c"]).unwrap();

        let b = archive.group("a/b").unwrap();
        assert_eq!(b.groups.len(), 2);
        assert_eq!(archive.root().groups.len(), 1);
    }

    #[test]
    fn test_create_and_lookup_dataset() {
        let mut archive = Archive::new();
        archive
            .create_dataset(&["0.5", "square"], "Z", values(&["1", "2", "3", "4"]))
            .unwrap();

        let dataset = archive.dataset("0.5/square/Z").unwrap();
        assert_eq!(dataset.dtype, UTF8_DTYPE);
        assert_eq!(dataset.values, values(&["1", "2", "3", "4"]));
        assert!(archive.dataset("0.5/Z").is_none());
        assert_eq!(archive.dataset_count(), 1);
    }

    #[test]
    fn test_duplicate_dataset_rejected() {
        let mut archive = Archive::new();
        archive
            .create_dataset(&["a", "b"], "Z", values(&["1", "2", "3", "4"]))
            .unwrap();
        let err = archive
            .create_dataset(&["a", "b"], "Z", values(&["5", "6", "7", "8"]))
            .unwrap_err();

        assert!(matches!(
            err,
            ArchiveError::DuplicateDataset { ref group, ref name } if group == "a/b" && name == "Z"
        ));
        // First write is kept.
        assert_eq!(archive.dataset("a/b/Z").unwrap().values[0], "1");
    }

    #[test]
    fn test_dataset_blocks_group_of_same_name() {
        let mut archive = Archive::new();
        archive.create_dataset(&["a"], "Z", values(&["1"])).unwrap();

        let err = archive.require_group(&["a", "Z", "b"]).unwrap_err();
        assert!(matches!(err, ArchiveError::NotAGroup { ref path } if path == "a/Z"));

        archive.require_group(&["a", "g"]).unwrap();
        let err = archive.create_dataset(&["a"], "g", values(&["1"])).unwrap_err();
        assert!(matches!(err, ArchiveError::NameIsGroup { .. }));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut archive = Archive::new();
        assert!(matches!(
            archive.require_group(&["a", ""]),
            Err(ArchiveError::InvalidName(_))
        ));
        assert!(matches!(
            archive.require_group(&["a/b"]),
            Err(ArchiveError::InvalidName(_))
        ));
        assert!(matches!(
            archive.create_dataset(&["a"], "..", values(&["1"])),
            Err(ArchiveError::InvalidName(_))
        ));
    }

    #[test]
    fn test_datasets_listing() {
        let mut archive = Archive::new();
        archive.create_dataset(&["b", "y"], "Z", values(&["2"])).unwrap();
        archive.create_dataset(&["a", "x"], "Z", values(&["1"])).unwrap();

        let paths: Vec<String> = archive.datasets().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["a/x/Z".to_string(), "b/y/Z".to_string()]);
    }
}

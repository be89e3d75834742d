//! # Datasets
//!
//! A [`Dataset`] is the full set of records a service starts from: the
//! drug catalog, pharmacies, prescriptions, and any audit history. It can
//! be loaded from JSON or YAML files, and a small demo dataset ships with
//! the crate.

use std::collections::HashSet;
use std::hash::Hash;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audit::AuditLog;
use crate::drug::Drug;
use crate::error::RxError;
use crate::pharmacy::Pharmacy;
use crate::prescription::Prescription;

const DEMO_JSON: &str = include_str!("../data/demo.json");

/// On-disk format of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
}

impl DatasetFormat {
    /// Pick a format from a file extension. Anything other than
    /// `yaml`/`yml` is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Every record a service holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Drug catalog.
    #[serde(default)]
    pub drugs: Vec<Drug>,
    /// Pharmacy branches.
    #[serde(default)]
    pub pharmacies: Vec<Pharmacy>,
    /// Prescriptions.
    #[serde(default)]
    pub prescriptions: Vec<Prescription>,
    /// Fulfillment history.
    #[serde(default)]
    pub audit_logs: Vec<AuditLog>,
}

impl Dataset {
    /// The bundled demo dataset.
    pub fn demo() -> Result<Self, RxError> {
        Self::from_json_str(DEMO_JSON)
    }

    /// Parse and validate a JSON dataset.
    pub fn from_json_str(s: &str) -> Result<Self, RxError> {
        let dataset: Self = serde_json::from_str(s)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Parse and validate a YAML dataset.
    pub fn from_yaml_str(s: &str) -> Result<Self, RxError> {
        let dataset: Self = serde_yaml::from_str(s)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Load a dataset file, choosing the parser by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RxError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let dataset = match DatasetFormat::from_path(path) {
            DatasetFormat::Json => Self::from_json_str(&content)?,
            DatasetFormat::Yaml => Self::from_yaml_str(&content)?,
        };
        tracing::debug!(
            path = %path.display(),
            drugs = dataset.drugs.len(),
            pharmacies = dataset.pharmacies.len(),
            prescriptions = dataset.prescriptions.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Serialize in the given format.
    pub fn render(&self, format: DatasetFormat) -> Result<String, RxError> {
        Ok(match format {
            DatasetFormat::Json => serde_json::to_string_pretty(self)?,
            DatasetFormat::Yaml => serde_yaml::to_string(self)?,
        })
    }

    /// Write the dataset to `path`, choosing the format by extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RxError> {
        let path = path.as_ref();
        let body = self.render(DatasetFormat::from_path(path))?;
        std::fs::write(path, body)?;
        Ok(())
    }

    /// Reject datasets with duplicate identifiers within a collection.
    pub fn validate(&self) -> Result<(), RxError> {
        ensure_unique("drug", self.drugs.iter().map(|d| &d.id))?;
        ensure_unique("pharmacy", self.pharmacies.iter().map(|p| &p.id))?;
        ensure_unique("prescription", self.prescriptions.iter().map(|p| &p.id))?;
        ensure_unique("audit log", self.audit_logs.iter().map(|a| &a.id))?;
        Ok(())
    }
}

fn ensure_unique<'a, T>(kind: &str, ids: impl Iterator<Item = &'a T>) -> Result<(), RxError>
where
    T: Eq + Hash + std::fmt::Display + 'a,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(RxError::Dataset(format!("duplicate {kind} id {id}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditStatus;
    use crate::prescription::PrescriptionStatus;

    #[test]
    fn demo_dataset_loads() {
        let ds = Dataset::demo().unwrap();
        assert_eq!(ds.drugs.len(), 4);
        assert_eq!(ds.pharmacies.len(), 2);
        assert_eq!(ds.prescriptions.len(), 3);
        assert_eq!(ds.audit_logs.len(), 2);
        assert_eq!(ds.prescriptions[1].status, PrescriptionStatus::Fulfilled);
        assert_eq!(ds.audit_logs[1].status, AuditStatus::Failed);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut ds = Dataset::demo().unwrap();
        let dup = ds.drugs[0].clone();
        ds.drugs.push(dup);
        let err = ds.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate drug id D001"), "{err}");
    }

    #[test]
    fn yaml_and_json_files_load_back() {
        let ds = Dataset::demo().unwrap();
        let dir = tempfile::tempdir().unwrap();
        for name in ["data.json", "data.yaml"] {
            let path = dir.path().join(name);
            ds.save(&path).unwrap();
            assert_eq!(Dataset::load(&path).unwrap(), ds);
        }
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(DatasetFormat::from_path(Path::new("a.YML")), DatasetFormat::Yaml);
        assert_eq!(DatasetFormat::from_path(Path::new("a.json")), DatasetFormat::Json);
        assert_eq!(DatasetFormat::from_path(Path::new("noext")), DatasetFormat::Json);
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let ds = Dataset::from_json_str("{}").unwrap();
        assert!(ds.drugs.is_empty() && ds.audit_logs.is_empty());
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(
            Dataset::from_json_str("{\"drugs\": 3}"),
            Err(RxError::Json(_))
        ));
    }
}

//! # Pharmacies and Drug Allocations
//!
//! Each pharmacy branch carries an allocation table: the maximum dosage of
//! a drug it may dispense on one prescription line. Drugs absent from the
//! table are not limited by the branch.

use serde::{Deserialize, Serialize};

use crate::identity::{DrugId, PharmacyId};

/// Per-pharmacy dispensing limit for one drug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AllocatedDrug {
    /// The allocated drug.
    pub drug_id: DrugId,
    /// Display name of the drug.
    pub drug_name: String,
    /// Maximum dosage per prescription line.
    pub limit: u32,
}

/// A pharmacy branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Pharmacy {
    /// Branch identifier.
    pub id: PharmacyId,
    /// Branch name.
    pub name: String,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Allocation table.
    #[serde(default)]
    pub allocated_drugs: Vec<AllocatedDrug>,
}

impl Pharmacy {
    /// The allocation entry for `drug_id`, if the branch has one.
    pub fn allocation_for(&self, drug_id: &DrugId) -> Option<&AllocatedDrug> {
        self.allocated_drugs.iter().find(|a| &a.drug_id == drug_id)
    }
}

/// List filter for pharmacies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PharmacyFilter {
    /// Case-insensitive substring of the branch name.
    #[serde(default)]
    pub name: Option<String>,
}

impl PharmacyFilter {
    /// Whether `pharmacy` passes the filter.
    pub fn matches(&self, pharmacy: &Pharmacy) -> bool {
        match self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(needle) => pharmacy
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chengdu() -> Pharmacy {
        Pharmacy {
            id: PharmacyId::new("PH001").unwrap(),
            name: "Chengdu Main Branch".to_string(),
            address: Some("123 Main St, Chengdu".to_string()),
            phone: None,
            allocated_drugs: vec![AllocatedDrug {
                drug_id: DrugId::new("D001").unwrap(),
                drug_name: "Ibuprofen".to_string(),
                limit: 200,
            }],
        }
    }

    #[test]
    fn allocation_lookup() {
        let p = chengdu();
        let d001 = DrugId::new("D001").unwrap();
        let d004 = DrugId::new("D004").unwrap();
        assert_eq!(p.allocation_for(&d001).map(|a| a.limit), Some(200));
        assert!(p.allocation_for(&d004).is_none());
    }

    #[test]
    fn name_filter() {
        let p = chengdu();
        assert!(PharmacyFilter { name: Some("chengdu".into()) }.matches(&p));
        assert!(!PharmacyFilter { name: Some("shanghai".into()) }.matches(&p));
        assert!(PharmacyFilter::default().matches(&p));
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let json = serde_json::to_value(chengdu()).unwrap();
        assert!(json.get("phone").is_none());
        assert_eq!(json["allocatedDrugs"][0]["drugId"], "D001");
    }
}

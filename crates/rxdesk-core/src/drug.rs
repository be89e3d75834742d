//! # Drug Catalog Records
//!
//! A [`Drug`] is one batch of a medicine held in central stock. Besides the
//! record itself this module carries the stock rules the back office shows
//! next to every drug:
//!
//! | Rule | Condition |
//! |------|-----------|
//! | expired | `expiry <= today` |
//! | low stock | `stock < threshold` (default 20) |
//! | stock status | `critical` below 10, `low` below 20, else `normal` |
//! | alert level | `high` if expired or critical, `medium` if low, else `none` |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::DrugId;

/// Stock below this count is reported as low.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 20;

/// Stock below this count is reported as critical.
pub const CRITICAL_STOCK_THRESHOLD: u32 = 10;

/// A drug batch in the central catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Drug {
    /// Catalog identifier.
    pub id: DrugId,
    /// Drug name.
    pub name: String,
    /// Manufacturer name.
    pub manufacturer: String,
    /// Batch number.
    pub batch: String,
    /// Last day the batch may be dispensed is the day before this date.
    pub expiry: NaiveDate,
    /// Units currently in stock.
    pub stock: u32,
    /// Stock capacity for this drug.
    pub limit: u32,
}

/// Stock classification of a drug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    /// At or above the low-stock threshold.
    Normal,
    /// Below the low-stock threshold.
    Low,
    /// Below the critical threshold.
    Critical,
}

impl StockStatus {
    /// Return the wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Low => "low",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently a drug needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Nothing to report.
    #[serde(rename = "none")]
    Clear,
    /// Stock is low.
    Medium,
    /// Expired or critically low.
    High,
}

impl AlertLevel {
    /// Return the wire representation of this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "none",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl Drug {
    /// Whether the batch is expired on `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry <= today
    }

    /// Whether stock is below `threshold`.
    pub fn is_low_stock(&self, threshold: u32) -> bool {
        self.stock < threshold
    }

    /// Classify the current stock level.
    pub fn stock_status(&self) -> StockStatus {
        if self.stock < CRITICAL_STOCK_THRESHOLD {
            StockStatus::Critical
        } else if self.stock < DEFAULT_LOW_STOCK_THRESHOLD {
            StockStatus::Low
        } else {
            StockStatus::Normal
        }
    }

    /// Stock as a rounded percentage of `limit`, capped at 100.
    ///
    /// A drug with a zero limit reports 0.
    pub fn stock_percentage(&self) -> u8 {
        if self.limit == 0 {
            return 0;
        }
        let stock = u64::from(self.stock);
        let limit = u64::from(self.limit);
        // Round half up.
        let pct = (stock * 200 + limit) / (limit * 2);
        pct.min(100) as u8
    }

    /// Whether the drug is expired or low on stock.
    pub fn needs_alert(&self, today: NaiveDate) -> bool {
        self.is_expired(today) || self.is_low_stock(DEFAULT_LOW_STOCK_THRESHOLD)
    }

    /// Alert level on `today`.
    pub fn alert_level(&self, today: NaiveDate) -> AlertLevel {
        if self.is_expired(today) {
            return AlertLevel::High;
        }
        match self.stock_status() {
            StockStatus::Critical => AlertLevel::High,
            StockStatus::Low => AlertLevel::Medium,
            StockStatus::Normal => AlertLevel::Clear,
        }
    }

    /// Short status label: expiry takes precedence over stock.
    pub fn status_label(&self, today: NaiveDate) -> &'static str {
        if self.is_expired(today) {
            return "expired";
        }
        match self.stock_status() {
            StockStatus::Critical => "critically low",
            StockStatus::Low => "low",
            StockStatus::Normal => "in stock",
        }
    }

    /// Alert level and label on `today`, or `None` when the drug needs no
    /// attention.
    ///
    /// `threshold` can raise the low-stock line above the default. A drug
    /// that is only low by that configured line is reported at `Medium`.
    pub fn alert(&self, today: NaiveDate, threshold: u32) -> Option<(AlertLevel, &'static str)> {
        let low = self.is_low_stock(threshold) || self.stock_status() != StockStatus::Normal;
        if !self.is_expired(today) && !low {
            return None;
        }
        Some(match self.alert_level(today) {
            AlertLevel::Clear => (AlertLevel::Medium, "low"),
            level => (level, self.status_label(today)),
        })
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}

fn require_future(expiry: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if expiry <= today {
        Err(ValidationError::ExpiryNotInFuture { expiry, today })
    } else {
        Ok(())
    }
}

/// Payload for adding a drug to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewDrug {
    /// Drug name (required).
    pub name: String,
    /// Manufacturer name.
    #[serde(default)]
    pub manufacturer: String,
    /// Batch number (required).
    pub batch: String,
    /// Expiry date; must be after today.
    pub expiry: NaiveDate,
    /// Initial stock.
    #[serde(default)]
    pub stock: u32,
    /// Stock capacity.
    #[serde(default)]
    pub limit: u32,
}

impl NewDrug {
    /// Check required fields and that the expiry lies in the future.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("batch", &self.batch)?;
        require_future(self.expiry, today)
    }

    /// Build the catalog record under the given id.
    pub fn into_drug(self, id: DrugId) -> Drug {
        Drug {
            id,
            name: self.name.trim().to_string(),
            manufacturer: self.manufacturer.trim().to_string(),
            batch: self.batch.trim().to_string(),
            expiry: self.expiry,
            stock: self.stock,
            limit: self.limit,
        }
    }
}

/// Partial update of a drug. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DrugPatch {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New manufacturer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// New batch number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    /// New expiry; must be after today.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<NaiveDate>,
    /// New stock count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    /// New stock capacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl DrugPatch {
    /// Validate every provided field with the same rules as [`NewDrug`].
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(batch) = &self.batch {
            require_text("batch", batch)?;
        }
        if let Some(expiry) = self.expiry {
            require_future(expiry, today)?;
        }
        Ok(())
    }

    /// Apply the provided fields to `drug`.
    pub fn apply(self, drug: &mut Drug) {
        if let Some(name) = self.name {
            drug.name = name.trim().to_string();
        }
        if let Some(manufacturer) = self.manufacturer {
            drug.manufacturer = manufacturer.trim().to_string();
        }
        if let Some(batch) = self.batch {
            drug.batch = batch.trim().to_string();
        }
        if let Some(expiry) = self.expiry {
            drug.expiry = expiry;
        }
        if let Some(stock) = self.stock {
            drug.stock = stock;
        }
        if let Some(limit) = self.limit {
            drug.limit = limit;
        }
    }
}

/// List filter for the drug catalog. Absent or blank fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugFilter {
    /// Case-insensitive substring of the drug name.
    #[serde(default)]
    pub name: Option<String>,
    /// Case-insensitive substring of the manufacturer.
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Exact stock status.
    #[serde(default)]
    pub stock_status: Option<StockStatus>,
    /// Keep drugs expiring on or before this date.
    #[serde(default)]
    pub expires_before: Option<NaiveDate>,
}

fn contains_ci(haystack: &str, needle: Option<&String>) -> bool {
    match needle.map(|n| n.trim()).filter(|n| !n.is_empty()) {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

impl DrugFilter {
    /// Whether `drug` passes every provided criterion.
    pub fn matches(&self, drug: &Drug) -> bool {
        contains_ci(&drug.name, self.name.as_ref())
            && contains_ci(&drug.manufacturer, self.manufacturer.as_ref())
            && self
                .stock_status
                .map_or(true, |status| drug.stock_status() == status)
            && self
                .expires_before
                .map_or(true, |date| drug.expiry <= date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn drug(stock: u32, limit: u32, expiry: NaiveDate) -> Drug {
        Drug {
            id: DrugId::new("D001").unwrap(),
            name: "Ibuprofen".to_string(),
            manufacturer: "ACME Pharma".to_string(),
            batch: "B202403".to_string(),
            expiry,
            stock,
            limit,
        }
    }

    #[test]
    fn expired_on_and_after_expiry_day() {
        let d = drug(150, 200, date(2026, 1, 1));
        assert!(!d.is_expired(date(2025, 12, 31)));
        assert!(d.is_expired(date(2026, 1, 1)));
        assert!(d.is_expired(date(2026, 6, 1)));
    }

    #[test]
    fn low_stock_uses_threshold() {
        let d = drug(15, 100, date(2030, 1, 1));
        assert!(d.is_low_stock(DEFAULT_LOW_STOCK_THRESHOLD));
        assert!(!d.is_low_stock(10));
        assert!(!drug(20, 100, date(2030, 1, 1)).is_low_stock(20));
    }

    #[test]
    fn alert_level_displays_its_wire_name() {
        for level in [AlertLevel::Clear, AlertLevel::Medium, AlertLevel::High] {
            let wire = serde_json::to_value(level).unwrap();
            assert_eq!(wire, level.to_string());
        }
        assert_eq!(format!("[{:<6}]", AlertLevel::High), "[high  ]");
    }

    #[test]
    fn alert_reports_expiry_before_stock() {
        let today = date(2025, 6, 1);
        assert_eq!(
            drug(5, 50, date(2024, 12, 1)).alert(today, DEFAULT_LOW_STOCK_THRESHOLD),
            Some((AlertLevel::High, "expired"))
        );
        assert_eq!(
            drug(5, 50, date(2030, 1, 1)).alert(today, DEFAULT_LOW_STOCK_THRESHOLD),
            Some((AlertLevel::High, "critically low"))
        );
        assert_eq!(
            drug(15, 50, date(2030, 1, 1)).alert(today, DEFAULT_LOW_STOCK_THRESHOLD),
            Some((AlertLevel::Medium, "low"))
        );
        assert_eq!(drug(80, 150, date(2030, 1, 1)).alert(today, DEFAULT_LOW_STOCK_THRESHOLD), None);
    }

    #[test]
    fn alert_honors_a_raised_threshold() {
        let today = date(2025, 6, 1);
        let d = drug(30, 150, date(2030, 1, 1));
        assert_eq!(d.alert(today, DEFAULT_LOW_STOCK_THRESHOLD), None);
        assert_eq!(d.alert(today, 50), Some((AlertLevel::Medium, "low")));
    }

    #[test]
    fn stock_status_boundaries() {
        let exp = date(2030, 1, 1);
        assert_eq!(drug(0, 10, exp).stock_status(), StockStatus::Critical);
        assert_eq!(drug(9, 10, exp).stock_status(), StockStatus::Critical);
        assert_eq!(drug(10, 10, exp).stock_status(), StockStatus::Low);
        assert_eq!(drug(19, 10, exp).stock_status(), StockStatus::Low);
        assert_eq!(drug(20, 10, exp).stock_status(), StockStatus::Normal);
    }

    #[test]
    fn stock_percentage_rounds_and_caps() {
        let exp = date(2030, 1, 1);
        assert_eq!(drug(150, 200, exp).stock_percentage(), 75);
        assert_eq!(drug(1, 3, exp).stock_percentage(), 33);
        assert_eq!(drug(2, 3, exp).stock_percentage(), 67);
        assert_eq!(drug(1, 200, exp).stock_percentage(), 1);
        assert_eq!(drug(300, 200, exp).stock_percentage(), 100);
        assert_eq!(drug(5, 0, exp).stock_percentage(), 0);
    }

    #[test]
    fn alert_level_prefers_expiry() {
        let today = date(2025, 6, 1);
        assert_eq!(drug(150, 200, date(2024, 6, 1)).alert_level(today), AlertLevel::High);
        assert_eq!(drug(5, 200, date(2030, 1, 1)).alert_level(today), AlertLevel::High);
        assert_eq!(drug(15, 200, date(2030, 1, 1)).alert_level(today), AlertLevel::Medium);
        assert_eq!(drug(50, 200, date(2030, 1, 1)).alert_level(today), AlertLevel::Clear);
    }

    #[test]
    fn needs_alert_and_labels() {
        let today = date(2025, 6, 1);
        let expired = drug(150, 200, date(2024, 6, 1));
        assert!(expired.needs_alert(today));
        assert_eq!(expired.status_label(today), "expired");

        let healthy = drug(150, 200, date(2026, 1, 1));
        assert!(!healthy.needs_alert(today));
        assert_eq!(healthy.status_label(today), "in stock");

        assert_eq!(drug(5, 50, date(2030, 1, 1)).status_label(today), "critically low");
        assert_eq!(drug(15, 50, date(2030, 1, 1)).status_label(today), "low");
    }

    #[test]
    fn alert_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&AlertLevel::Clear).unwrap(), "\"none\"");
        assert_eq!(serde_json::to_string(&AlertLevel::High).unwrap(), "\"high\"");
    }

    #[test]
    fn drug_json_shape_is_camel_case() {
        let d = drug(150, 200, date(2026, 1, 1));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["id"], "D001");
        assert_eq!(json["expiry"], "2026-01-01");
        assert_eq!(json["stock"], 150);
    }

    #[test]
    fn new_drug_requires_name_batch_and_future_expiry() {
        let today = date(2025, 6, 1);
        let mut new = NewDrug {
            name: "Cetirizine".to_string(),
            manufacturer: "MedCorp".to_string(),
            batch: "B1".to_string(),
            expiry: date(2026, 6, 1),
            stock: 40,
            limit: 100,
        };
        assert!(new.validate(today).is_ok());

        new.name = "  ".to_string();
        assert_eq!(new.validate(today), Err(ValidationError::EmptyField("name")));

        new.name = "Cetirizine".to_string();
        new.batch = String::new();
        assert_eq!(new.validate(today), Err(ValidationError::EmptyField("batch")));

        new.batch = "B1".to_string();
        new.expiry = today;
        assert!(matches!(
            new.validate(today),
            Err(ValidationError::ExpiryNotInFuture { .. })
        ));
    }

    #[test]
    fn new_drug_into_drug_trims() {
        let new = NewDrug {
            name: " Cetirizine ".to_string(),
            manufacturer: String::new(),
            batch: "B1 ".to_string(),
            expiry: date(2026, 6, 1),
            stock: 0,
            limit: 0,
        };
        let d = new.into_drug(DrugId::sequential(5));
        assert_eq!(d.id, "D005");
        assert_eq!(d.name, "Cetirizine");
        assert_eq!(d.batch, "B1");
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut d = drug(150, 200, date(2026, 1, 1));
        let patch = DrugPatch {
            stock: Some(90),
            name: Some("Ibuprofen 400".to_string()),
            ..Default::default()
        };
        assert!(patch.validate(date(2025, 6, 1)).is_ok());
        patch.apply(&mut d);
        assert_eq!(d.stock, 90);
        assert_eq!(d.name, "Ibuprofen 400");
        assert_eq!(d.batch, "B202403");
        assert_eq!(d.limit, 200);
    }

    #[test]
    fn patch_rejects_past_expiry() {
        let patch = DrugPatch {
            expiry: Some(date(2024, 1, 1)),
            ..Default::default()
        };
        assert!(patch.validate(date(2025, 6, 1)).is_err());
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let d = drug(15, 200, date(2026, 1, 1));
        let filter = DrugFilter {
            name: Some("ibu".to_string()),
            manufacturer: Some("acme".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&d));

        let filter = DrugFilter {
            name: Some("aspirin".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&d));
    }

    #[test]
    fn filter_blank_fields_match_everything() {
        let d = drug(15, 200, date(2026, 1, 1));
        let filter = DrugFilter {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&d));
        assert!(DrugFilter::default().matches(&d));
    }

    #[test]
    fn filter_by_status_and_expiry() {
        let d = drug(15, 200, date(2026, 1, 1));
        let low = DrugFilter {
            stock_status: Some(StockStatus::Low),
            ..Default::default()
        };
        assert!(low.matches(&d));
        let normal = DrugFilter {
            stock_status: Some(StockStatus::Normal),
            ..Default::default()
        };
        assert!(!normal.matches(&d));

        let before = DrugFilter {
            expires_before: Some(date(2026, 1, 1)),
            ..Default::default()
        };
        assert!(before.matches(&d));
        let earlier = DrugFilter {
            expires_before: Some(date(2025, 12, 31)),
            ..Default::default()
        };
        assert!(!earlier.matches(&d));
    }
}

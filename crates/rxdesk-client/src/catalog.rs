//! Cached drug catalog.
//!
//! Holds the last fetched drug list and the last error, the state a
//! back-office screen renders from. Writes go to the server first and only
//! touch the cache once the server accepts them.

use chrono::NaiveDate;
use rxdesk_core::{Drug, DrugFilter, DrugId, DrugPatch, NewDrug};

use crate::drugs::DrugClient;
use crate::error::ClientError;

/// Drug list cache backed by a [`DrugClient`].
#[derive(Debug, Clone)]
pub struct DrugCatalog {
    client: DrugClient,
    drugs: Vec<Drug>,
    error: Option<String>,
}

impl DrugCatalog {
    /// An empty catalog. Call [`DrugCatalog::refresh`] to populate it.
    pub fn new(client: DrugClient) -> Self {
        Self {
            client,
            drugs: Vec::new(),
            error: None,
        }
    }

    /// Reload every drug from the server.
    ///
    /// On failure the cached list is cleared and the error recorded.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        match self.client.list(&DrugFilter::default()).await {
            Ok(drugs) => {
                tracing::debug!(count = drugs.len(), "drug catalog refreshed");
                self.drugs = drugs;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.drugs.clear();
                Err(self.record(e))
            }
        }
    }

    /// Create a drug and append it to the cache.
    pub async fn add(&mut self, drug: &NewDrug) -> Result<Drug, ClientError> {
        match self.client.create(drug).await {
            Ok(created) => {
                self.drugs.push(created.clone());
                Ok(created)
            }
            Err(e) => Err(self.record(e)),
        }
    }

    /// Update a drug and replace its cached copy.
    pub async fn update(&mut self, id: &DrugId, patch: &DrugPatch) -> Result<Drug, ClientError> {
        match self.client.update(id, patch).await {
            Ok(updated) => {
                match self.drugs.iter_mut().find(|d| d.id == updated.id) {
                    Some(slot) => *slot = updated.clone(),
                    None => self.drugs.push(updated.clone()),
                }
                Ok(updated)
            }
            Err(e) => Err(self.record(e)),
        }
    }

    /// Delete a drug and drop it from the cache.
    pub async fn remove(&mut self, id: &DrugId) -> Result<(), ClientError> {
        match self.client.delete(id).await {
            Ok(()) => {
                self.drugs.retain(|d| &d.id != id);
                Ok(())
            }
            Err(e) => Err(self.record(e)),
        }
    }

    fn record(&mut self, error: ClientError) -> ClientError {
        tracing::warn!(%error, "drug catalog request failed");
        self.error = Some(error.to_string());
        error
    }

    /// Forget the last error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// The last recorded error, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Cached drugs in server order.
    pub fn drugs(&self) -> &[Drug] {
        &self.drugs
    }

    pub fn total(&self) -> usize {
        self.drugs.len()
    }

    /// Cached drugs with stock below `threshold`.
    pub fn low_stock(&self, threshold: u32) -> Vec<&Drug> {
        self.drugs
            .iter()
            .filter(|d| d.is_low_stock(threshold))
            .collect()
    }

    /// Cached drugs expired on `today`.
    pub fn expired(&self, today: NaiveDate) -> Vec<&Drug> {
        self.drugs.iter().filter(|d| d.is_expired(today)).collect()
    }

    pub fn get(&self, id: &DrugId) -> Option<&Drug> {
        self.drugs.iter().find(|d| &d.id == id)
    }
}

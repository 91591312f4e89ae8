//! Spreadsheet values API client
//!
//! Thin REST client for the spreadsheet that mirrors ledger state for
//! reporting. Constructed once at startup from injected configuration and
//! shared by reference. Every call is a no-op while export is disabled, and
//! requests are time-bounded so a slow spreadsheet backend cannot stall a
//! caller. Calls are never retried here; the mirror is best-effort.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;

use crate::config::SheetsConfig;
use crate::error::{AppError, AppResult};

/// Spreadsheet API client
#[derive(Clone)]
pub struct SheetsClient {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    api_token: String,
    enabled: bool,
}

impl SheetsClient {
    /// Create a new SheetsClient from configuration
    pub fn new(config: &SheetsConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("failed to build sheets client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            api_token: config.api_token.clone(),
            enabled: config.enabled,
        })
    }

    /// Whether spreadsheet export is enabled
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Replace the cell values of a range
    pub async fn update_range(&self, range: &str, rows: Vec<Vec<String>>) -> AppResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let url = format!(
            "{}/{}/values/{}?valueInputOption=RAW",
            self.base_url, self.spreadsheet_id, range
        );
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(&json!({ "values": rows }))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("sheets update failed: {}", e)))?;

        Self::check(response).await
    }

    /// Clear the cell values of a range, leaving headers intact when the
    /// range starts below row 1
    pub async fn clear_range(&self, range: &str) -> AppResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let url = format!(
            "{}/{}/values/{}:clear",
            self.base_url, self.spreadsheet_id, range
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("sheets clear failed: {}", e)))?;

        Self::check(response).await
    }

    /// Append a single row after the last populated row of a range
    pub async fn append_row(&self, range: &str, row: Vec<String>) -> AppResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let url = format!(
            "{}/{}/values/{}:append?valueInputOption=RAW",
            self.base_url, self.spreadsheet_id, range
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("sheets append failed: {}", e)))?;

        Self::check(response).await
    }

    async fn check(response: reqwest::Response) -> AppResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AppError::ExternalService(format!(
                "sheets API error: {} - {}",
                status, body
            )))
        }
    }
}

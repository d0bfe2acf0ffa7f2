//! Profile store client for the Stride app
//!
//! This crate talks to the hosted record service (PostgREST-style
//! `/rest/v1/<table>` endpoints). A slim query layer covers the filters
//! the application actually issues; `RecordsClient` exposes typed
//! operations over the `profiles`, `dashboard_stats` and `goals` tables.

mod models;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use url::Url;

pub use models::*;

/// Error details as the record service reports them
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for ApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Error type for record service operations
#[derive(Error, Debug)]
pub enum RecordsError {
    #[error("API error: {details} (Status: {status})")]
    ApiError {
        details: ApiErrorDetails,
        status: reqwest::StatusCode,
    },

    #[error("API error (unparsed): {message} (Status: {status})")]
    UnparsedApiError {
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

fn api_error(status: reqwest::StatusCode, error_text: String) -> RecordsError {
    match serde_json::from_str::<ApiErrorDetails>(&error_text) {
        Ok(details) => RecordsError::ApiError { details, status },
        Err(_) => RecordsError::UnparsedApiError {
            message: error_text,
            status,
        },
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A query against one table
pub struct TableQuery {
    base_url: String,
    table: String,
    http_client: Client,
    headers: HeaderMap,
    query_params: HashMap<String, String>,
}

impl TableQuery {
    fn new(base_url: &str, api_key: &str, table: &str, http_client: Client) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key).unwrap_or(HeaderValue::from_static("")),
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        Self {
            base_url: base_url.to_string(),
            table: table.to_string(),
            http_client,
            headers,
            query_params: HashMap::new(),
        }
    }

    /// Attach a bearer token so row-level security sees the caller
    pub fn with_auth(mut self, token: &str) -> Result<Self, RecordsError> {
        let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            RecordsError::InvalidParameters("Invalid authorization token".to_string())
        })?;
        self.headers
            .insert(HeaderName::from_static("authorization"), value);
        Ok(self)
    }

    /// Choose the columns to return
    pub fn select(mut self, columns: &str) -> Self {
        self.query_params
            .insert("select".to_string(), columns.to_string());
        self
    }

    /// Equality filter
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.query_params
            .insert(column.to_string(), format!("eq.{}", value));
        self
    }

    /// Sort the result set
    pub fn order(mut self, column: &str, order: SortOrder) -> Self {
        let order_str = match order {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        };
        self.query_params
            .insert("order".to_string(), format!("{}.{}", column, order_str));
        self
    }

    /// Cap the number of rows returned
    pub fn limit(mut self, count: i32) -> Self {
        self.query_params
            .insert("limit".to_string(), count.to_string());
        self
    }

    fn build_url(&self) -> Result<String, RecordsError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, self.table))?;

        for (key, value) in &self.query_params {
            url.query_pairs_mut().append_pair(key, value);
        }

        Ok(url.to_string())
    }

    /// Run the query, returning all matching rows
    pub async fn execute<T: for<'de> Deserialize<'de>>(&self) -> Result<Vec<T>, RecordsError> {
        let url = self.build_url()?;

        let response = self
            .http_client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(RecordsError::NetworkError)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(api_error(status, error_text));
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| RecordsError::DeserializationError(e.to_string()))
    }

    /// Run the query, returning the first matching row if any
    pub async fn single<T: for<'de> Deserialize<'de>>(self) -> Result<Option<T>, RecordsError> {
        let rows = self.limit(1).execute::<T>().await?;
        Ok(rows.into_iter().next())
    }

    /// Insert rows, returning the representation the service sends back
    pub async fn insert<T: Serialize>(&self, values: T) -> Result<Value, RecordsError> {
        let url = self.build_url()?;

        let mut headers = self.headers.clone();
        headers.insert(
            HeaderName::from_static("prefer"),
            HeaderValue::from_static("return=representation"),
        );

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(&values)
            .send()
            .await
            .map_err(RecordsError::NetworkError)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(api_error(status, error_text));
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| RecordsError::DeserializationError(e.to_string()))?;

        // A 201 with an empty body happens when the Prefer header is ignored
        if body_text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str::<Value>(&body_text)
            .map_err(|e| RecordsError::DeserializationError(e.to_string()))
    }
}

/// Client for the hosted record service
pub struct RecordsClient {
    base_url: String,
    api_key: String,
    http_client: Client,
}

impl RecordsClient {
    /// Create a new record service client
    pub fn new(base_url: &str, api_key: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http_client,
        }
    }

    /// Start a query against an arbitrary table
    pub fn from(&self, table: &str) -> TableQuery {
        TableQuery::new(
            &self.base_url,
            &self.api_key,
            table,
            self.http_client.clone(),
        )
    }

    /// Fetch the profile row for an identity id
    pub async fn fetch_profile(&self, id: &str) -> Result<Option<UserProfile>, RecordsError> {
        self.from("profiles")
            .select("*")
            .eq("id", id)
            .single::<UserProfile>()
            .await
    }

    /// Insert a freshly registered profile row
    ///
    /// Plain insert, not an upsert: a second row for the same identity id
    /// is a conflict error from the service.
    pub async fn insert_profile(&self, profile: NewProfile) -> Result<UserProfile, RecordsError> {
        let inserted = self.from("profiles").insert(&profile).await?;

        let row = inserted
            .as_array()
            .and_then(|rows| rows.first())
            .cloned()
            .ok_or_else(|| {
                RecordsError::DeserializationError(
                    "insert returned no representation".to_string(),
                )
            })?;

        serde_json::from_value::<UserProfile>(row)
            .map_err(|e| RecordsError::DeserializationError(e.to_string()))
    }

    /// Insert the all-zero dashboard row for a new user
    pub async fn insert_dashboard_stats(&self, user_id: &str) -> Result<(), RecordsError> {
        self.from("dashboard_stats")
            .insert(&DashboardStats::zeroed(user_id))
            .await?;
        Ok(())
    }

    /// Fetch the dashboard aggregates for a user
    pub async fn fetch_dashboard_stats(
        &self,
        user_id: &str,
    ) -> Result<Option<DashboardStats>, RecordsError> {
        self.from("dashboard_stats")
            .select("*")
            .eq("user_id", user_id)
            .single::<DashboardStats>()
            .await
    }

    /// Fetch a user's goals, soonest due first
    pub async fn fetch_goals(&self, user_id: &str) -> Result<Vec<GoalRecord>, RecordsError> {
        self.from("goals")
            .select("*")
            .eq("user_id", user_id)
            .order("due_date", SortOrder::Ascending)
            .execute::<GoalRecord>()
            .await
    }
}

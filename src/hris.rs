//! Client for the HR information system's employee directory.
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::Employee;

const MISSING_HRIS_CONFIG: &str = "Missing HRIS API configuration.";

/// Directory lookup as the form controller sees it, so tests can substitute
/// a fake for [`HrisClient`].
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Fetch the raw directory response. Callers own normalization.
    async fn fetch_employees(&self) -> Result<Value>;
}

#[derive(Clone)]
pub struct HrisClient {
    http: Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for HrisClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HrisClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HrisClient {
    pub fn new(base_url: String, token: String) -> Self {
        let http = Client::builder()
            .user_agent("equipment-portal/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            token,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.hris.base_url.clone(), cfg.hris.token.clone())
    }

    /// One `GET {base_url}/employee` per call. No caching, no retry.
    pub async fn fetch_employees(&self) -> Result<Value> {
        if self.base_url.trim().is_empty() || self.token.trim().is_empty() {
            return Err(Error::config(MISSING_HRIS_CONFIG));
        }
        let url = format!("{}/employee", self.base_url);
        debug!(%url, "fetching employee directory");
        let res = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|err| Error::network(err.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::upstream(status.as_u16(), "Failed to fetch employees."));
        }
        let text = res
            .text()
            .await
            .map_err(|err| Error::network(err.to_string()))?;
        serde_json::from_str(&text).map_err(|err| {
            Error::upstream(status.as_u16(), format!("invalid directory response: {err}"))
        })
    }
}

#[async_trait]
impl DirectoryService for HrisClient {
    async fn fetch_employees(&self) -> Result<Value> {
        HrisClient::fetch_employees(self).await
    }
}

/// Pull the employee list out of a directory response: either a bare array
/// or an object carrying a `data` array.
pub fn employee_records(json: &Value) -> Option<&Vec<Value>> {
    match json {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("data").and_then(Value::as_array),
        _ => None,
    }
}

/// Normalize one raw directory record.
///
/// Upstream key spellings vary by deployment; per field the first key that
/// is present and non-null wins: id from `id`/`employeeId`/`ID`, name from
/// `name`/`fullname`/`fullName`, branch from `branch`/`Branch`, department
/// from `department`/`Department`. A present empty string still wins over a
/// later key.
pub fn normalize_employee(item: &Value) -> Employee {
    Employee {
        id: first_present(item, &["id", "employeeId", "ID"])
            .map(coerce_i64)
            .unwrap_or(0),
        name: first_present(item, &["name", "fullname", "fullName"])
            .map(coerce_string)
            .unwrap_or_default(),
        branch: first_present(item, &["branch", "Branch"])
            .map(coerce_string)
            .unwrap_or_default(),
        department: first_present(item, &["department", "Department"])
            .map(coerce_string)
            .unwrap_or_default(),
    }
}

pub fn normalize_employees(items: &[Value]) -> Vec<Employee> {
    items.iter().map(normalize_employee).collect()
}

fn first_present<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .find(|value| !value.is_null())
}

fn coerce_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

//! Thin REST client for Epsilla Cloud.
//!
//! Two levels mirror the service layout: [`EpsillaClient`] talks to the
//! project-scoped control plane (credential check, database lookup) and
//! [`EpsillaVectorDb`] talks to the data plane of a single database, whose
//! host is resolved from the database's `public_endpoint`.
//!
//! Every response body is an envelope `{statusCode, message, result}`. A call
//! only succeeds when the HTTP status is 2xx and the envelope's `statusCode`,
//! when present, is 200.

use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::EpsillaConfig;

const API_PREFIX: &str = "/api/v3/project";

#[derive(Debug, thiserror::Error)]
pub enum EpsillaError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered successfully but the payload had an unexpected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for EpsillaError {
    fn from(e: reqwest::Error) -> Self {
        EpsillaError::Transport(e.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(rename = "statusCode")]
    status_code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<Value>,
}

/// A successful response, reduced to the parts callers inspect.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub message: String,
    pub result: Option<Value>,
}

/// Column definition used when creating a table.
#[derive(Debug, Clone, Serialize)]
pub struct TableField {
    pub name: String,
    #[serde(rename = "dataType")]
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(rename = "primaryKey", skip_serializing_if = "std::ops::Not::not")]
    pub primary_key: bool,
}

impl TableField {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            dimensions: None,
            primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// One row of an insert payload.
#[derive(Debug, Serialize)]
pub struct EpsillaRecord<'a> {
    pub id: &'a str,
    pub vector: &'a [f32],
    pub metadata: &'a Map<String, Value>,
    pub file_entry_id: String,
}

#[derive(Debug, Serialize)]
pub struct QueryRequest<'a> {
    pub table: &'a str,
    #[serde(rename = "queryField")]
    pub query_field: &'a str,
    #[serde(rename = "queryVector")]
    pub query_vector: &'a [f32],
    pub limit: usize,
    #[serde(rename = "withDistance")]
    pub with_distance: bool,
}

/// One row of a query result.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    #[serde(default)]
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(rename = "@distance")]
    pub distance: f32,
}

#[derive(Debug, Deserialize)]
struct DbInfo {
    public_endpoint: String,
}

async fn send(request: RequestBuilder, what: &str) -> Result<ApiResponse, EpsillaError> {
    let response = request.send().await?;
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) if status.is_success() => {
            return Err(EpsillaError::Decode(format!("{what}: failed to read body: {e}")))
        }
        Err(_) => String::new(),
    };
    let envelope: Envelope = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => {
            warn!("Epsilla {what} returned {status} with an undecodable body: {body}");
            return Err(EpsillaError::Decode(format!("{what}: {e}")));
        }
        // Gateways answer errors with plain text or HTML; keep it as the message.
        Err(_) => Envelope {
            message: Some(body),
            ..Envelope::default()
        },
    };

    let body_ok = envelope.status_code.map(|code| code == 200).unwrap_or(true);
    if !status.is_success() || !body_ok {
        let code = envelope.status_code.unwrap_or_else(|| status.as_u16());
        let message = envelope.message.unwrap_or_default();
        warn!("Epsilla {what} returned {code}: {message}");
        return Err(EpsillaError::Api {
            status: code,
            message,
        });
    }

    debug!("Epsilla {what} succeeded");
    Ok(ApiResponse {
        message: envelope.message.unwrap_or_default(),
        result: envelope.result,
    })
}

/// Project-scoped client. Cheap to build; one is created per connector call.
pub struct EpsillaClient {
    http: reqwest::Client,
    api_key: String,
    project_id: String,
    /// Control-plane base, e.g. `https://api.epsilla.com/api/v3/project/<id>`.
    base_url: String,
}

impl EpsillaClient {
    pub fn new(config: &EpsillaConfig) -> Result<Self, EpsillaError> {
        let endpoint = config.api_endpoint.trim_end_matches('/');
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            project_id: config.project_id.clone(),
            base_url: format!("{endpoint}{API_PREFIX}/{}", config.project_id),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("X-API-Key", &self.api_key)
    }

    /// Check that the project exists and the API key is accepted.
    pub async fn validate(&self) -> Result<(), EpsillaError> {
        let url = format!("{}/vectordb/list", self.base_url);
        send(self.request(Method::GET, &url), "validate").await?;
        Ok(())
    }

    /// Resolve the data-plane endpoint of `db_id`.
    pub async fn vectordb(&self, db_id: &str) -> Result<EpsillaVectorDb, EpsillaError> {
        let url = format!("{}/vectordb/{}", self.base_url, db_id);
        let response = send(self.request(Method::GET, &url), "database lookup").await?;

        let info: DbInfo = response
            .result
            .ok_or_else(|| EpsillaError::Decode("database lookup returned no result".into()))
            .and_then(|v| {
                serde_json::from_value(v).map_err(|e| EpsillaError::Decode(e.to_string()))
            })?;

        let host = info.public_endpoint.trim_end_matches('/');
        let host = if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        let base_url = format!("{host}{API_PREFIX}/{}/vectordb/{}", self.project_id, db_id);
        debug!("Resolved Epsilla database {} at {}", db_id, base_url);

        Ok(EpsillaVectorDb {
            http: self.http.clone(),
            api_key: self.api_key.clone(),
            base_url,
        })
    }
}

/// Data-plane client for a single database.
pub struct EpsillaVectorDb {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl EpsillaVectorDb {
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("X-API-Key", &self.api_key)
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, EpsillaError> {
        let response = send(self.request(Method::GET, "/table/list"), "list tables").await?;
        match response.result {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(v) => serde_json::from_value(v).map_err(|e| EpsillaError::Decode(e.to_string())),
        }
    }

    pub async fn create_table(&self, name: &str, fields: &[TableField]) -> Result<(), EpsillaError> {
        let body = json!({ "name": name, "fields": fields });
        send(self.request(Method::POST, "/table/create").json(&body), "create table").await?;
        Ok(())
    }

    pub async fn insert(
        &self,
        table: &str,
        records: &[EpsillaRecord<'_>],
    ) -> Result<ApiResponse, EpsillaError> {
        let body = json!({ "table": table, "data": records });
        send(self.request(Method::POST, "/data/insert").json(&body), "insert").await
    }

    pub async fn query(&self, request: &QueryRequest<'_>) -> Result<Vec<QueryMatch>, EpsillaError> {
        let response = send(self.request(Method::POST, "/data/query").json(request), "query").await?;
        match response.result {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(v) => serde_json::from_value(v).map_err(|e| EpsillaError::Decode(e.to_string())),
        }
    }

    pub async fn delete(&self, table: &str, filter: &str) -> Result<(), EpsillaError> {
        let body = json!({ "table": table, "filter": filter });
        send(self.request(Method::POST, "/data/delete").json(&body), "delete").await?;
        Ok(())
    }

    /// Read rows of `table`, restricted to `response_fields` when non-empty.
    pub async fn get(&self, table: &str, response_fields: &[&str]) -> Result<Vec<Value>, EpsillaError> {
        let mut body = json!({ "table": table });
        if !response_fields.is_empty() {
            body["response"] = json!(response_fields);
        }
        let response = send(self.request(Method::POST, "/data/get").json(&body), "get").await?;
        match response.result {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(rows)) => Ok(rows),
            Some(other) => Err(EpsillaError::Decode(format!(
                "expected a list of rows, got {other}"
            ))),
        }
    }
}

/// Render an equality filter on a string column, doubling embedded quotes.
pub fn string_eq_filter(column: &str, value: &str) -> String {
    format!("{} = '{}'", column, value.replace('\'', "''"))
}

use crate::core::geo::FeatureCollection;
use crate::domain::model::Record;
use crate::domain::ports::{RecordSource, Storage};
use crate::utils::error::{FraError, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Records fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<Record>,
}

impl StaticSource {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn sample() -> Self {
        Self::new(sample_claims())
    }
}

impl RecordSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }
}

/// Reads a JSON array of objects (or a single object) through a `Storage`.
#[derive(Debug, Clone)]
pub struct JsonFileSource<S: Storage> {
    storage: S,
    path: String,
}

impl<S: Storage> JsonFileSource<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }
}

impl<S: Storage> RecordSource for JsonFileSource<S> {
    async fn fetch(&self) -> Result<Vec<Record>> {
        tracing::debug!("Reading records from {}", self.path);
        let bytes = self.storage.read_file(&self.path).await?;
        let value: Value = serde_json::from_slice(&bytes)?;
        Ok(records_from_json(value))
    }
}

/// GETs a JSON endpoint. A non-success status is an error.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    endpoint: String,
    headers: HashMap<String, String>,
}

impl HttpSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            headers: HashMap::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }
}

impl RecordSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<Record>> {
        tracing::debug!("Making API request to: {}", self.endpoint);
        let mut request = self.client.get(&self.endpoint);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request.send().await?;
        tracing::debug!("API response status: {}", response.status());

        if !response.status().is_success() {
            return Err(FraError::ApiStatusError {
                status: response.status().as_u16(),
                endpoint: self.endpoint.clone(),
            });
        }

        let value: Value = response.json().await?;
        Ok(records_from_json(value))
    }
}

/// Arrays yield one record per object element; a lone object is one record.
/// Non-object elements are dropped.
pub fn records_from_json(value: Value) -> Vec<Record> {
    match value {
        Value::Array(items) => {
            let total = items.len();
            let records: Vec<Record> = items.into_iter().filter_map(Record::from_json).collect();
            if records.len() < total {
                tracing::warn!("Dropped {} non-object entries", total - records.len());
            }
            records
        }
        other => Record::from_json(other).into_iter().collect(),
    }
}

pub async fn load_feature_collection<S: Storage>(
    storage: &S,
    path: &str,
) -> Result<FeatureCollection> {
    let bytes = storage.read_file(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// How a run obtains its records.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    Sample,
    File(String),
    Api {
        endpoint: String,
        timeout: Option<Duration>,
        headers: HashMap<String, String>,
    },
}

impl SourceSpec {
    /// `sample`, an `http(s)://` URL, or a file path.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if spec.eq_ignore_ascii_case("sample") {
            SourceSpec::Sample
        } else if spec.starts_with("http://") || spec.starts_with("https://") {
            SourceSpec::Api {
                endpoint: spec.to_string(),
                timeout: None,
                headers: HashMap::new(),
            }
        } else {
            SourceSpec::File(spec.to_string())
        }
    }
}

pub enum ConfiguredSource<S: Storage> {
    Static(StaticSource),
    File(JsonFileSource<S>),
    Http(HttpSource),
}

impl<S: Storage> ConfiguredSource<S> {
    pub fn build(spec: &SourceSpec, storage: S) -> Result<Self> {
        Ok(match spec {
            SourceSpec::Sample => ConfiguredSource::Static(StaticSource::sample()),
            SourceSpec::File(path) => ConfiguredSource::File(JsonFileSource::new(storage, path.clone())),
            SourceSpec::Api {
                endpoint,
                timeout,
                headers,
            } => {
                let mut source = HttpSource::new(endpoint.clone()).with_headers(headers.clone());
                if let Some(timeout) = timeout {
                    source = source.with_timeout(*timeout)?;
                }
                ConfiguredSource::Http(source)
            }
        })
    }
}

impl<S: Storage> RecordSource for ConfiguredSource<S> {
    async fn fetch(&self) -> Result<Vec<Record>> {
        match self {
            ConfiguredSource::Static(source) => source.fetch().await,
            ConfiguredSource::File(source) => source.fetch().await,
            ConfiguredSource::Http(source) => source.fetch().await,
        }
    }
}

/// FRA claim rows shown on the claims map.
pub fn sample_claims() -> Vec<Record> {
    let rows = json!([
        {"id": 1, "holder": "Ram Singh", "village": "Village A", "district": "Bastar", "state": "Chhattisgarh", "lat": 19.05, "lon": 81.55, "status": "Approved", "area": "2.5 acres", "tribe": "Gond", "type": "IFR", "date": "2025-09-01"},
        {"id": 2, "holder": "Sita Devi", "village": "Village B", "district": "Dantewada", "state": "Chhattisgarh", "lat": 18.85, "lon": 81.75, "status": "Pending", "area": "1.8 acres", "tribe": "Baiga", "type": "IFR", "date": "2025-08-20"},
        {"id": 3, "holder": "Gopal Yadav", "village": "Village A", "district": "Bastar", "state": "Chhattisgarh", "lat": 19.08, "lon": 81.52, "status": "Approved", "area": "3.2 acres", "tribe": "Pardhan", "type": "CFR", "date": "2025-08-10"},
        {"id": 4, "holder": "Maya Bai", "village": "Village C", "district": "Kanker", "state": "Chhattisgarh", "lat": 20.12, "lon": 81.30, "status": "Rejected", "area": "1.5 acres", "tribe": "Halba", "type": "IFR", "date": "2025-07-15"},
        {"id": 5, "holder": "Kumar Singh", "village": "Village D", "district": "Kondagaon", "state": "Chhattisgarh", "lat": 19.80, "lon": 81.90, "status": "Under Review", "area": "2.8 acres", "tribe": "Mariya", "type": "CFR", "date": "2025-07-01"}
    ]);
    records_from_json(rows)
}

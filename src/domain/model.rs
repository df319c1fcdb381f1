use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A flat claim/report row. Field values are JSON primitives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.data.insert(field.to_string(), value.into());
        self
    }

    /// Builds a record from a JSON object; anything else is rejected.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(obj) => Some(Self {
                data: obj.into_iter().collect(),
            }),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<&Value> {
        self.field("id")
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name).filter(|v| !v.is_null())
    }

    /// Text rendering used for matching and export: strings verbatim,
    /// numbers and booleans via their JSON form.
    pub fn field_text(&self, name: &str) -> Option<String> {
        self.field(name).map(value_text)
    }
}

pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDatum {
    pub label: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ChartDatum {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    ForestOfficer,
    DistrictCoordinator,
    DataAnalyst,
    DistrictOfficer,
    Ngo,
    Viewer,
    Public,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::ForestOfficer => "forest_officer",
            Role::DistrictCoordinator => "district_coordinator",
            Role::DataAnalyst => "data_analyst",
            Role::DistrictOfficer => "district_officer",
            Role::Ngo => "ngo",
            Role::Viewer => "viewer",
            Role::Public => "public",
        };
        f.write_str(name)
    }
}

/// Opaque signed-in user token. Only `id`, `name` and `role` are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub role: Role,
}

/// Fields pulled out of an OCR'd claim document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraFields {
    pub claimant_name: Option<String>,
    pub village: Option<String>,
    pub area: Option<String>,
    pub area_units: Option<String>,
    pub claim_status: Option<String>,
}

/// One window of a filtered, sorted record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<Record>,
    pub index: usize,
    pub size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl Page {
    /// One-based page number for display.
    pub fn number(&self) -> usize {
        self.index.saturating_add(1)
    }
}

#[derive(Debug, Clone)]
pub struct ReportResult {
    pub page: Page,
    pub matched_records: Vec<Record>,
    pub csv_output: String,
    pub summary: Vec<ChartDatum>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_text_renders_primitives() {
        let record = Record::new()
            .with("id", 7)
            .with("holder", "Ram Singh")
            .with("lat", 19.05)
            .with("verified", true)
            .with("note", Value::Null);

        assert_eq!(record.field_text("id").as_deref(), Some("7"));
        assert_eq!(record.field_text("holder").as_deref(), Some("Ram Singh"));
        assert_eq!(record.field_text("lat").as_deref(), Some("19.05"));
        assert_eq!(record.field_text("verified").as_deref(), Some("true"));
        assert_eq!(record.field_text("note"), None);
        assert_eq!(record.field_text("missing"), None);
    }

    #[test]
    fn test_from_json_accepts_objects_only() {
        assert!(Record::from_json(json!({"id": 1})).is_some());
        assert!(Record::from_json(json!([1, 2])).is_none());
        assert!(Record::from_json(json!("claim")).is_none());
    }

    #[test]
    fn test_page_number_saturates() {
        let page = Page {
            items: Vec::new(),
            index: usize::MAX,
            size: 10,
            total_items: 3,
            total_pages: 1,
        };
        assert_eq!(page.number(), usize::MAX);
        assert_eq!(Page { index: 0, ..page }.number(), 1);
    }

    #[test]
    fn test_role_serde_names() {
        let session: Session = serde_json::from_value(json!({
            "id": 2, "username": "officer", "name": "District Officer", "role": "district_officer"
        }))
        .unwrap();
        assert_eq!(session.role, Role::DistrictOfficer);
        assert_eq!(session.role.to_string(), "district_officer");
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One employment-history entry. Optional and validated on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentEntry {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl EmploymentEntry {
    /// An entry counts only when company, position and start date are all filled in.
    pub fn is_counted(&self) -> bool {
        !self.company.trim().is_empty()
            && !self.position.trim().is_empty()
            && !self.start_date.trim().is_empty()
    }
}

/// A user's saved profile: named fields plus optional employment history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub employment: Vec<EmploymentEntry>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The trimmed value of `name`, or `None` when missing or blank.
    pub fn filled(&self, name: &str) -> Option<&str> {
        self.value(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Overlays `patch` onto this record. Fields absent from the patch keep their value.
    pub fn merge(&mut self, patch: ProfilePatch) {
        self.fields.extend(patch.fields);
        if let Some(employment) = patch.employment {
            self.employment = employment;
        }
    }

    /// Employment entries that pass the per-entry check.
    pub fn counted_employment(&self) -> Vec<&EmploymentEntry> {
        self.employment.iter().filter(|e| e.is_counted()).collect()
    }
}

/// A partial update submitted by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub employment: Option<Vec<EmploymentEntry>>,
}

impl ProfilePatch {
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }
}

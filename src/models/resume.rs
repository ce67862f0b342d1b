use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What is known about a file before it is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub content_type: String,
    pub size: u64,
}

/// Metadata of the committed resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub file_name: String,
    pub file_size: u64,
    pub upload_date: DateTime<Utc>,
    pub file_type: String,
}

/// Fixed output of the simulated resume parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResume {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub education: String,
}

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        profile::ProfilePatch,
        resume::{FileDescriptor, ParsedResume, ResumeRecord},
    },
};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// MIME types accepted as a resume.
pub const ALLOWED_RESUME_TYPES: [&str; 3] = [MIME_PDF, MIME_DOC, MIME_DOCX];

/// Largest accepted resume, 5 MiB.
pub const MAX_RESUME_BYTES: u64 = 5 * 1024 * 1024;

/// Why a file was refused as a resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeRejection {
    UnsupportedType(String),
    TooLarge(u64),
    Empty,
    MissingName,
    /// The content's signature contradicts the declared type.
    ContentMismatch { declared: String, detected: String },
}

impl From<ResumeRejection> for AppError {
    fn from(rejection: ResumeRejection) -> Self {
        match rejection {
            ResumeRejection::UnsupportedType(_) => AppError::Validation(
                "Please select a valid file (PDF, DOC, or DOCX)".to_string(),
            ),
            ResumeRejection::TooLarge(_) => {
                AppError::PayloadTooLarge("File size must be less than 5MB".to_string())
            }
            ResumeRejection::Empty => AppError::Validation("File is empty".to_string()),
            ResumeRejection::MissingName => {
                AppError::Validation("File name is required".to_string())
            }
            ResumeRejection::ContentMismatch { declared, detected } => AppError::Validation(
                format!("File content ({}) does not match its type ({})", detected, declared),
            ),
        }
    }
}

/// A file that passed the gate and can be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingResume {
    descriptor: FileDescriptor,
}

impl PendingResume {
    pub fn descriptor(&self) -> &FileDescriptor {
        &self.descriptor
    }

    /// Turns the pending attachment into the stored record.
    pub fn commit(self, uploaded_at: DateTime<Utc>) -> ResumeRecord {
        ResumeRecord {
            file_name: self.descriptor.name,
            file_size: self.descriptor.size,
            upload_date: uploaded_at,
            file_type: self.descriptor.content_type,
        }
    }
}

/// Validates a file descriptor without touching any state.
pub fn check(descriptor: FileDescriptor) -> Result<PendingResume, ResumeRejection> {
    if descriptor.name.trim().is_empty() {
        return Err(ResumeRejection::MissingName);
    }
    if !ALLOWED_RESUME_TYPES.contains(&descriptor.content_type.as_str()) {
        return Err(ResumeRejection::UnsupportedType(descriptor.content_type));
    }
    if descriptor.size == 0 {
        return Err(ResumeRejection::Empty);
    }
    if descriptor.size > MAX_RESUME_BYTES {
        return Err(ResumeRejection::TooLarge(descriptor.size));
    }
    Ok(PendingResume { descriptor })
}

fn compatible(declared: &str, detected: &str) -> bool {
    declared == detected
        || (declared == MIME_DOCX && detected == "application/zip")
        || (declared == MIME_DOC && detected == "application/x-ole-storage")
}

/// Compares the content's magic bytes with the declared type.
///
/// Content without a recognisable signature is let through on its declared type.
pub fn sniff(declared: &str, content: &[u8]) -> Result<(), ResumeRejection> {
    match infer::get(content) {
        Some(kind) if !compatible(declared, kind.mime_type()) => {
            Err(ResumeRejection::ContentMismatch {
                declared: declared.to_string(),
                detected: kind.mime_type().to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Runs the gate and the content sniff on an uploaded file.
pub fn admit(descriptor: FileDescriptor, content: &[u8]) -> Result<PendingResume, ResumeRejection> {
    let pending = check(descriptor)?;
    sniff(&pending.descriptor.content_type, content)?;
    Ok(pending)
}

/// Output of the simulated parsing service.
pub fn mock_parse(_pending: &PendingResume) -> ParsedResume {
    ParsedResume {
        name: "John Doe".to_string(),
        email: "john.doe@example.com".to_string(),
        phone: "+1 (555) 123-4567".to_string(),
        skills: ["JavaScript", "Python", "React", "Node.js", "SQL"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        experience: "5 years of software development experience".to_string(),
        education: "Bachelor of Computer Science".to_string(),
    }
}

/// Profile fields a client may pre-fill from parsed resume data. Blank values are left out.
pub fn autofill(parsed: &ParsedResume) -> ProfilePatch {
    let mut words = parsed.name.split_whitespace();
    let first_name = words.next().unwrap_or_default().to_string();
    let last_name = words.collect::<Vec<_>>().join(" ");

    let candidates = [
        ("firstName", first_name),
        ("lastName", last_name),
        ("phone", parsed.phone.trim().to_string()),
        ("skills", parsed.skills.join(", ")),
        ("bio", parsed.experience.trim().to_string()),
    ];

    let mut patch = ProfilePatch::default();
    for (name, value) in candidates {
        if !value.is_empty() {
            patch.fields.insert(name.to_string(), value);
        }
    }
    patch
}

/// Human-readable size with base-1024 units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(content_type: &str, size: u64) -> FileDescriptor {
        FileDescriptor {
            name: "resume".to_string(),
            content_type: content_type.to_string(),
            size,
        }
    }

    #[test]
    fn accepts_exactly_the_three_types() {
        for mime in ALLOWED_RESUME_TYPES {
            assert!(check(descriptor(mime, 1024)).is_ok(), "{} should pass", mime);
        }
        for mime in ["text/plain", "image/png", "application/zip", "APPLICATION/PDF", ""] {
            assert_eq!(
                check(descriptor(mime, 1024)),
                Err(ResumeRejection::UnsupportedType(mime.to_string()))
            );
        }
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(check(descriptor(MIME_PDF, MAX_RESUME_BYTES)).is_ok());
        assert_eq!(
            check(descriptor(MIME_PDF, MAX_RESUME_BYTES + 1)),
            Err(ResumeRejection::TooLarge(MAX_RESUME_BYTES + 1))
        );
        assert_eq!(
            check(descriptor(MIME_DOCX, 6 * 1024 * 1024)),
            Err(ResumeRejection::TooLarge(6 * 1024 * 1024))
        );
        assert_eq!(check(descriptor(MIME_PDF, 0)), Err(ResumeRejection::Empty));
    }

    #[test]
    fn rejection_maps_to_status_class() {
        assert!(matches!(
            AppError::from(ResumeRejection::TooLarge(1)),
            AppError::PayloadTooLarge(_)
        ));
        assert!(matches!(
            AppError::from(ResumeRejection::UnsupportedType("x".into())),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn sniff_catches_mislabelled_content() {
        let pdf = b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n";
        assert!(sniff(MIME_PDF, pdf).is_ok());

        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert!(matches!(
            sniff(MIME_PDF, &png),
            Err(ResumeRejection::ContentMismatch { .. })
        ));
        assert!(matches!(
            sniff(MIME_DOCX, pdf),
            Err(ResumeRejection::ContentMismatch { .. })
        ));

        assert!(sniff(MIME_DOC, b"no signature here").is_ok());
    }

    #[test]
    fn commit_keeps_descriptor_fields() {
        let now = Utc::now();
        let record = check(FileDescriptor {
            name: "cv.docx".to_string(),
            content_type: MIME_DOCX.to_string(),
            size: 2048,
        })
        .unwrap()
        .commit(now);

        assert_eq!(record.file_name, "cv.docx");
        assert_eq!(record.file_size, 2048);
        assert_eq!(record.file_type, MIME_DOCX);
        assert_eq!(record.upload_date, now);
    }

    #[test]
    fn autofill_splits_name_and_joins_skills() {
        let pending = check(descriptor(MIME_PDF, 10)).unwrap();
        let patch = autofill(&mock_parse(&pending));

        assert_eq!(patch.fields["firstName"], "John");
        assert_eq!(patch.fields["lastName"], "Doe");
        assert_eq!(patch.fields["phone"], "+1 (555) 123-4567");
        assert_eq!(patch.fields["skills"], "JavaScript, Python, React, Node.js, SQL");
        assert_eq!(patch.fields["bio"], "5 years of software development experience");
        assert!(patch.employment.is_none());
    }

    #[test]
    fn autofill_skips_blank_values() {
        let parsed = ParsedResume {
            name: "Cher".to_string(),
            email: String::new(),
            phone: " ".to_string(),
            skills: vec![],
            experience: String::new(),
            education: String::new(),
        };
        let patch = autofill(&parsed);
        assert_eq!(patch.fields.len(), 1);
        assert_eq!(patch.fields["firstName"], "Cher");
    }

    #[test]
    fn formats_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(MAX_RESUME_BYTES), "5 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }
}

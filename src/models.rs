// certificate-generation-service/src/models.rs

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Shown on the certificate when the caller supplies no subject name.
pub const DEFAULT_SUBJECT_NAME: &str = "Student";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Course,
    Diploma,
}

impl RecordKind {
    pub fn filename_suffix(&self) -> &'static str {
        match self {
            RecordKind::Course => "_Certificate.pdf",
            RecordKind::Diploma => "_Academy_Diploma.pdf",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            RecordKind::Course => "Certificate of Completion",
            RecordKind::Diploma => "Academy Diploma",
        }
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            RecordKind::Course => "certificate",
            RecordKind::Diploma => "diploma",
        }
    }
}

/// One achievement to certify. Immutable for the lifetime of a render pass;
/// `id` is the identity the one-shot generation is keyed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub subject_name: Option<String>,
    pub achievement_title: String,
    /// ISO-8601; absent or unparseable falls back to "now".
    #[serde(default)]
    pub issued_date: Option<String>,
    pub record_kind: RecordKind,
}

impl AchievementRecord {
    pub fn subject_or_placeholder(&self) -> &str {
        match self.subject_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => DEFAULT_SUBJECT_NAME,
        }
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_date
            .as_deref()
            .and_then(parse_issue_date)
            .unwrap_or_else(Utc::now)
    }

    /// Derived download name: every character of the title outside ASCII
    /// alphanumerics becomes an underscore, then the kind suffix is appended.
    pub fn output_file_name(&self) -> String {
        let slug: String = self
            .achievement_title
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}{}", slug, self.record_kind.filename_suffix())
    }
}

fn parse_issue_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// References to the three decorative raster images, resolved by the host's
/// static-asset mechanism. Treated as opaque here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateAssets {
    pub seal: String,
    pub watermark: String,
    pub badge: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateRequest {
    pub records: Vec<AchievementRecord>,
    pub assets: CertificateAssets,
}

impl CertificateRequest {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Metadata for one document handed to the file-save mechanism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCertificate {
    pub file_name: String,
    pub path: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub sha256_checksum: String,
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub rendering_duration_ms: i32,
}

/// What a single generation run produced. A detached target and a repeat of
/// an already-rendered record are recoverable no-ops, not errors.
#[derive(Debug)]
pub enum Outcome {
    Saved(SavedCertificate),
    TargetDetached,
    Unchanged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateResponse {
    pub request_id: String,
    pub status: String,
    pub certificates: Vec<SavedCertificate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl CertificateResponse {
    pub fn success(request_id: String, certificates: Vec<SavedCertificate>) -> Self {
        Self {
            request_id,
            status: "success".to_string(),
            certificates,
            error: None,
            generated_at: Utc::now(),
        }
    }

    pub fn error(request_id: String, error: String) -> Self {
        Self {
            request_id,
            status: "error".to_string(),
            certificates: vec![],
            error: Some(error),
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, kind: RecordKind) -> AchievementRecord {
        AchievementRecord {
            id: Uuid::new_v4(),
            subject_name: None,
            achievement_title: title.to_string(),
            issued_date: None,
            record_kind: kind,
        }
    }

    #[test]
    fn filename_substitutes_each_non_alphanumeric_character() {
        let r = record("Intro: Biblical Studies!", RecordKind::Course);
        assert_eq!(r.output_file_name(), "Intro__Biblical_Studies__Certificate.pdf");
    }

    #[test]
    fn filename_handles_slashes_and_punctuation() {
        let r = record("Old/New Testament (Part 2)", RecordKind::Course);
        assert_eq!(
            r.output_file_name(),
            "Old_New_Testament__Part_2__Certificate.pdf"
        );
    }

    #[test]
    fn filename_maps_unicode_to_underscores() {
        let r = record("Café Théologie", RecordKind::Diploma);
        assert_eq!(r.output_file_name(), "Caf__Th_ologie_Academy_Diploma.pdf");
    }

    #[test]
    fn filename_suffix_follows_record_kind() {
        assert!(record("X", RecordKind::Course)
            .output_file_name()
            .ends_with("_Certificate.pdf"));
        assert!(record("X", RecordKind::Diploma)
            .output_file_name()
            .ends_with("_Academy_Diploma.pdf"));
    }

    #[test]
    fn subject_name_falls_back_to_placeholder() {
        let mut r = record("X", RecordKind::Course);
        assert_eq!(r.subject_or_placeholder(), DEFAULT_SUBJECT_NAME);
        r.subject_name = Some("   ".to_string());
        assert_eq!(r.subject_or_placeholder(), DEFAULT_SUBJECT_NAME);
        r.subject_name = Some("Jane Doe".to_string());
        assert_eq!(r.subject_or_placeholder(), "Jane Doe");
    }

    #[test]
    fn issue_date_parses_rfc3339_and_plain_dates() {
        let mut r = record("X", RecordKind::Course);
        r.issued_date = Some("2024-05-01T10:30:00Z".to_string());
        assert_eq!(r.issued_at().to_rfc3339(), "2024-05-01T10:30:00+00:00");
        r.issued_date = Some("2024-05-01".to_string());
        assert_eq!(r.issued_at().format("%Y-%m-%d").to_string(), "2024-05-01");
    }

    #[test]
    fn unparseable_issue_date_falls_back_to_now() {
        let mut r = record("X", RecordKind::Course);
        r.issued_date = Some("not a date".to_string());
        let before = Utc::now();
        let issued = r.issued_at();
        assert!(issued >= before);
    }
}

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Task priority as stored by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Case-insensitive parse; the service historically stored free-form
    /// strings like "High".
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("unknown priority: {s}")))
    }
}

/// A task as returned by the service. The id and timestamps are
/// server-assigned; the client never fabricates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        default,
        with = "instant_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(with = "instant")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "instant")]
    pub updated_at: DateTime<Utc>,
}

/// Create payload: only the user-editable fields. Never carries id or
/// timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "instant_opt", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// Partial update payload. Absent fields are omitted from the JSON body
/// entirely, so the service leaves them unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(with = "instant_opt", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Result of the health probe. Never constructed from a failure path; the
/// gateway degrades to `unavailable` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub status: String,
    pub natural_language_available: bool,
}

impl HealthReport {
    pub fn degraded() -> Self {
        Self {
            status: "error".to_string(),
            natural_language_available: false,
        }
    }
}

/// Parse a wire timestamp. RFC 3339 is taken as-is; a naive timestamp
/// (the backend emits `isoformat()` without a zone) is treated as UTC.
fn parse_instant(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(format!("unrecognized timestamp: {s}"))
}

pub(crate) mod instant {
    use super::*;

    pub fn serialize<S: Serializer>(
        t: &DateTime<Utc>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_instant(&s).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod instant_opt {
    use super::*;

    pub fn serialize<S: Serializer>(
        t: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match t {
            Some(t) => instant::serialize(t, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) => parse_instant(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Convert user-entered due-date text into an absolute instant.
///
/// Accepted: empty (→ absent), full RFC 3339, `YYYY-MM-DD HH:MM`,
/// `YYYY-MM-DDTHH:MM`, or a bare `YYYY-MM-DD` (midnight). Wall-clock
/// forms are interpreted in the user's local zone and converted to UTC
/// before anything is sent.
pub fn parse_due_input(input: &str) -> Result<Option<DateTime<Utc>>> {
    let s = input.trim();
    if s.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_to_utc(naive).map(Some);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        && let Some(naive) = date.and_hms_opt(0, 0, 0)
    {
        return local_to_utc(naive).map(Some);
    }
    Err(Error::Validation(format!(
        "unrecognized due date: {s} (use YYYY-MM-DD or YYYY-MM-DD HH:MM)"
    )))
}

fn local_to_utc(naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    match chrono::Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => Err(Error::Validation(format!(
            "due date {naive} does not exist in the local timezone"
        ))),
    }
}

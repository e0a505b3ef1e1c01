use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Tutor,
    Student,
}

impl UserRole {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tutor" => Some(UserRole::Tutor),
            "student" => Some(UserRole::Student),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Tutor => "tutor",
            UserRole::Student => "student",
        }
    }
}

/// Self-reported daily mood, best to worst. The wire values are the
/// literals the mobile client sends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MoodValue {
    #[serde(rename = "bien")]
    Bien,
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "mal")]
    Mal,
    #[serde(rename = "muyMal")]
    MuyMal,
}

impl MoodValue {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bien" => Some(MoodValue::Bien),
            "regular" => Some(MoodValue::Regular),
            "mal" => Some(MoodValue::Mal),
            "muyMal" => Some(MoodValue::MuyMal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodValue::Bien => "bien",
            MoodValue::Regular => "regular",
            MoodValue::Mal => "mal",
            MoodValue::MuyMal => "muyMal",
        }
    }

    /// Low moods derive an alert; anything else derives nothing.
    pub fn alert_severity(&self) -> Option<Severity> {
        match self {
            MoodValue::MuyMal => Some(Severity::High),
            MoodValue::Mal => Some(Severity::Medium),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JustificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl JustificationStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(JustificationStatus::Pending),
            "approved" => Some(JustificationStatus::Approved),
            "rejected" => Some(JustificationStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JustificationStatus::Pending => "pending",
            JustificationStatus::Approved => "approved",
            JustificationStatus::Rejected => "rejected",
        }
    }
}

// Common response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

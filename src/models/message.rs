use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Category of a catalog message, derived from the first letter of its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageCategory {
    Error,
    Info,
    Validation,
}

impl MessageCategory {
    /// `E` error, `I` info, `V` validation. The code is expected to be normalized.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.chars().next()? {
            'E' => Some(MessageCategory::Error),
            'I' => Some(MessageCategory::Info),
            'V' => Some(MessageCategory::Validation),
            _ => None,
        }
    }

    /// Parses the explicit type names used by the detail endpoint.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "error" => Some(MessageCategory::Error),
            "information" | "info" => Some(MessageCategory::Info),
            "validation" => Some(MessageCategory::Validation),
            _ => None,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            MessageCategory::Error => "user_error",
            MessageCategory::Info => "user_information",
            MessageCategory::Validation => "user_validation",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageCategory::Error => "error",
            MessageCategory::Info => "info",
            MessageCategory::Validation => "validation",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageRecord {
    pub code: String,
    pub text: String,
}

/// Which tier answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageSource {
    #[serde(rename = "DB")]
    Db,
    #[serde(rename = "CONSTANTS")]
    Constants,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedMessage {
    #[serde(rename = "type")]
    pub category: MessageCategory,
    pub code: String,
    pub message: String,
}

impl ResolvedMessage {
    pub fn error(code: &str, message: &str) -> Self {
        ResolvedMessage {
            category: MessageCategory::Error,
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MessageDetail {
    pub code: String,
    pub message: String,
    pub source: MessageSource,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ErrorRow {
    pub error_code: String,
    pub error_message: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ValidationRow {
    pub validation_code: String,
    pub validation_message: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct InformationRow {
    pub information_code: String,
    pub information_text: String,
}

/// The three catalog tables in the shape the frontend caches them.
#[derive(Debug, Clone, Serialize, Default)]
pub struct MessageTables {
    pub user_error: Vec<ErrorRow>,
    pub user_validation: Vec<ValidationRow>,
    pub user_information: Vec<InformationRow>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Advice field a question is asked against.
///
/// The backend matches answers within the selected field, so the list here
/// mirrors the dataset's fields exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceField {
    Marketing,
    Sales,
    Finance,
    Operations,
    IdeaValidation,
}

impl AdviceField {
    pub const ALL: [AdviceField; 5] = [
        AdviceField::Marketing,
        AdviceField::Sales,
        AdviceField::Finance,
        AdviceField::Operations,
        AdviceField::IdeaValidation,
    ];

    /// Wire and display name of this field.
    pub fn title(&self) -> &'static str {
        match self {
            AdviceField::Marketing => "Marketing",
            AdviceField::Sales => "Sales",
            AdviceField::Finance => "Finance",
            AdviceField::Operations => "Operations",
            AdviceField::IdeaValidation => "Idea Validation",
        }
    }

    /// Get the next field (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            AdviceField::Marketing => AdviceField::Sales,
            AdviceField::Sales => AdviceField::Finance,
            AdviceField::Finance => AdviceField::Operations,
            AdviceField::Operations => AdviceField::IdeaValidation,
            AdviceField::IdeaValidation => AdviceField::Marketing,
        }
    }

    /// Get the previous field (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            AdviceField::Marketing => AdviceField::IdeaValidation,
            AdviceField::Sales => AdviceField::Marketing,
            AdviceField::Finance => AdviceField::Sales,
            AdviceField::Operations => AdviceField::Finance,
            AdviceField::IdeaValidation => AdviceField::Operations,
        }
    }
}

/// Chat endpoint response.
///
/// Only `answer` is always present; the match metadata is omitted when the
/// backend falls below its similarity threshold.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    #[serde(default)]
    pub matched_question: Option<String>,
    #[serde(default)]
    pub similarity_score: Option<f64>,
    #[serde(default)]
    pub detected_field: Option<String>,
}

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One transcript entry, as displayed and persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn bot(message: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

//! Wire messages of `chat.v1.ChatService`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{FieldValue, Message, MessageType};
use crate::validation::{Rule, RuleSet};

/// Request of `Say`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SayRequest {
    pub sentence: String,
}

impl SayRequest {
    pub fn new(sentence: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
        }
    }
}

impl Message for SayRequest {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "sentence" => Some(FieldValue::Text(&self.sentence)),
            _ => None,
        }
    }
}

impl MessageType for SayRequest {
    const TYPE_NAME: &'static str = "chat.v1.SayRequest";

    fn rule_set() -> RuleSet {
        RuleSet::new(Self::TYPE_NAME).field("sentence", [Rule::MinLen(1)])
    }
}

/// Response of `Say`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SayResponse {
    pub sentence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

impl Message for SayResponse {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "sentence" => Some(FieldValue::Text(&self.sentence)),
            "respondedAt" => Some(FieldValue::Timestamp(self.responded_at.as_ref())),
            _ => None,
        }
    }
}

impl MessageType for SayResponse {
    const TYPE_NAME: &'static str = "chat.v1.SayResponse";

    fn rule_set() -> RuleSet {
        RuleSet::new(Self::TYPE_NAME)
            .field("sentence", [Rule::MinLen(1)])
            .field("respondedAt", [Rule::Required])
    }
}

//! Declarative validation rules.
//!
//! Rules are plain data attached to field names. Evaluation of a single rule
//! against a single field value lives here; walking a whole message (and
//! nested messages) is the validator's job.

use regex::Regex;

use crate::message::FieldValue;

/// Rule id reported when a rule names a field the message does not expose.
pub const UNKNOWN_FIELD: &str = "field.unknown";

/// A constraint attached to a field.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Text must be non-empty; timestamps and messages must be set.
    Required,
    /// Minimum length in characters.
    MinLen(usize),
    /// Maximum length in characters.
    MaxLen(usize),
    /// Text must match the expression.
    Pattern(Regex),
    /// Validate a nested message against its own registered rule set.
    Nested,
}

impl Rule {
    /// Build a `Pattern` rule from an expression.
    pub fn pattern(expr: &str) -> Result<Self, regex::Error> {
        Regex::new(expr).map(Rule::Pattern)
    }

    /// Stable identifier reported in violations.
    pub fn id(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::MinLen(_) => "string.min_len",
            Rule::MaxLen(_) => "string.max_len",
            Rule::Pattern(_) => "string.pattern",
            Rule::Nested => "message.nested",
        }
    }

    /// Check `value` against this rule, returning the violation message if it fails.
    ///
    /// `Nested` only checks the value kind here; descending into the nested
    /// message is done by the validator.
    pub fn check(&self, value: FieldValue<'_>) -> Option<String> {
        match (self, value) {
            (Rule::Required, FieldValue::Text(s)) if s.is_empty() => {
                Some("value is required".to_string())
            }
            (Rule::Required, FieldValue::Timestamp(None) | FieldValue::Message(None)) => {
                Some("value is required".to_string())
            }
            (Rule::Required, _) => None,
            (Rule::MinLen(min), FieldValue::Text(s)) => (s.chars().count() < *min)
                .then(|| format!("value length must be at least {min} characters")),
            (Rule::MaxLen(max), FieldValue::Text(s)) => (s.chars().count() > *max)
                .then(|| format!("value length must be at most {max} characters")),
            (Rule::Pattern(re), FieldValue::Text(s)) => (!re.is_match(s))
                .then(|| format!("value does not match regex pattern `{}`", re.as_str())),
            (Rule::Nested, FieldValue::Message(_)) => None,
            (rule, value) => Some(format!(
                "rule {} does not apply to {} fields",
                rule.id(),
                kind_of(value)
            )),
        }
    }
}

fn kind_of(value: FieldValue<'_>) -> &'static str {
    match value {
        FieldValue::Text(_) => "text",
        FieldValue::Timestamp(_) => "timestamp",
        FieldValue::Message(_) => "message",
    }
}

/// The rules declared for one field, in declaration order.
#[derive(Debug, Clone)]
pub struct FieldRules {
    pub name: &'static str,
    pub rules: Vec<Rule>,
}

/// All rules bound to one message type.
#[derive(Debug, Clone)]
pub struct RuleSet {
    message: &'static str,
    fields: Vec<FieldRules>,
}

impl RuleSet {
    /// An empty rule set for the named message type.
    pub fn new(message: &'static str) -> Self {
        Self {
            message,
            fields: Vec::new(),
        }
    }

    /// Declare rules for a field. Fields are evaluated in declaration order.
    pub fn field(mut self, name: &'static str, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.fields.push(FieldRules {
            name,
            rules: rules.into_iter().collect(),
        });
        self
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn fields(&self) -> &[FieldRules] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|f| f.rules.is_empty())
    }
}

//! The validator: an immutable registry of rule sets keyed by message type.

use std::collections::HashMap;

use crate::message::{FieldValue, Message, MessageType};
use crate::validation::result::{ValidationResult, Violation};
use crate::validation::rules::{Rule, RuleSet, UNKNOWN_FIELD};

/// Validates messages against the rule set registered for their type.
///
/// Built once at startup and shared by reference; `validate` is pure and
/// holds no state between calls.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    rule_sets: HashMap<&'static str, RuleSet>,
}

impl Validator {
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::default()
    }

    /// The rule set registered for `type_name`, if any.
    pub fn rule_set(&self, type_name: &str) -> Option<&RuleSet> {
        self.rule_sets.get(type_name)
    }

    /// Validate `msg`. Types without a registered rule set are always valid.
    pub fn validate(&self, msg: &dyn Message) -> ValidationResult {
        let mut violations = Vec::new();
        self.collect(msg, "", &mut violations);
        if violations.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(violations)
        }
    }

    fn collect(&self, msg: &dyn Message, prefix: &str, out: &mut Vec<Violation>) {
        let Some(rule_set) = self.rule_sets.get(msg.type_name()) else {
            return;
        };

        for field in rule_set.fields() {
            let path = if prefix.is_empty() {
                field.name.to_string()
            } else {
                format!("{prefix}.{}", field.name)
            };

            let Some(value) = msg.field(field.name) else {
                if !field.rules.is_empty() {
                    out.push(Violation {
                        field: path,
                        rule: UNKNOWN_FIELD,
                        message: format!("message has no field named `{}`", field.name),
                    });
                }
                continue;
            };

            for rule in &field.rules {
                if let Some(message) = rule.check(value) {
                    out.push(Violation {
                        field: path.clone(),
                        rule: rule.id(),
                        message,
                    });
                    continue;
                }
                if let (Rule::Nested, FieldValue::Message(Some(nested))) = (rule, value) {
                    self.collect(nested, &path, out);
                }
            }
        }
    }
}

/// Collects rule sets before freezing them into a [`Validator`].
#[derive(Debug, Default)]
pub struct ValidatorBuilder {
    rule_sets: HashMap<&'static str, RuleSet>,
}

impl ValidatorBuilder {
    /// Register the type's own rule set.
    pub fn register<M: MessageType>(mut self) -> Self {
        self.rule_sets.insert(M::TYPE_NAME, M::rule_set());
        self
    }

    /// Register (or replace) a rule set explicitly.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rule_sets.insert(rules.message(), rules);
        self
    }

    pub fn build(self) -> Validator {
        tracing::debug!(rule_sets = self.rule_sets.len(), "Validator built");
        Validator {
            rule_sets: self.rule_sets,
        }
    }
}

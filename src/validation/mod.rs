//! Message validation subsystem.
//!
//! # Data Flow
//! ```text
//! MessageType::rule_set()          (rules declared as data, per type)
//!     → ValidatorBuilder::register (collected once at startup)
//!     → Validator                  (immutable, shared by reference)
//!     → validate(&dyn Message)     → ValidationResult
//! ```
//!
//! # Design Decisions
//! - No process-wide validator: the instance is built explicitly and passed in
//! - Every rule is evaluated uniformly; handlers never special-case a rule
//! - All violations are reported, not just the first

pub mod result;
pub mod rules;
pub mod validator;

pub use result::{InvalidMessage, ValidationResult, Violation};
pub use rules::{FieldRules, Rule, RuleSet};
pub use validator::{Validator, ValidatorBuilder};

//! Message reflection contract.
//!
//! # Responsibilities
//! - Name every message type (request vs response) at the type level
//! - Expose named fields to the validator without knowing the concrete type
//! - Carry decoded messages through the interceptor chain type-erased
//!
//! # Design Decisions
//! - `Message` is object safe so interceptors and the validator work on `&dyn Message`
//! - The static rule set lives on `MessageType`, one rule set per type
//! - `AnyMessage` downcasts back to the concrete type at the handler edge

use std::any::Any;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::validation::RuleSet;

/// Borrowed view of a single field value.
#[derive(Clone, Copy)]
pub enum FieldValue<'a> {
    /// A text (string) field.
    Text(&'a str),
    /// A timestamp field, `None` when unset.
    Timestamp(Option<&'a DateTime<Utc>>),
    /// A nested message field, `None` when unset.
    Message(Option<&'a dyn Message>),
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            FieldValue::Timestamp(ts) => f.debug_tuple("Timestamp").field(ts).finish(),
            FieldValue::Message(m) => f
                .debug_tuple("Message")
                .field(&m.map(|m| m.type_name()))
                .finish(),
        }
    }
}

/// Upcast helper so `dyn Message` can be downcast to its concrete type.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

/// A structured value with named fields, identified by its type name.
pub trait Message: AsAny + fmt::Debug {
    /// Fully qualified type name, e.g. `chat.v1.SayRequest`.
    fn type_name(&self) -> &'static str;

    /// Look up a field by name. Returns `None` for fields the type does not have.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

/// Static side of a message: its name and the rules bound to it.
pub trait MessageType: Message + Sized {
    const TYPE_NAME: &'static str;

    /// The declarative rule set for this type.
    fn rule_set() -> RuleSet;
}

/// A type-erased message flowing through the interceptor chain.
pub struct AnyMessage(Box<dyn Message>);

impl AnyMessage {
    pub fn new<M: Message>(msg: M) -> Self {
        Self(Box::new(msg))
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// Borrow the message for inspection.
    pub fn as_message(&self) -> &dyn Message {
        &*self.0
    }

    pub fn downcast_ref<M: Message>(&self) -> Option<&M> {
        <dyn Message as AsAny>::as_any(&*self.0).downcast_ref::<M>()
    }

    /// Recover the concrete message. `None` when the envelope holds another type.
    pub fn downcast<M: Message>(self) -> Option<M> {
        <dyn Message as AsAny>::into_any(self.0)
            .downcast::<M>()
            .ok()
            .map(|msg| *msg)
    }
}

impl fmt::Debug for AnyMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

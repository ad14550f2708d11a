//! `chat.v1.ChatService`: a unary echo with validation on both edges.

pub mod service;
pub mod types;

pub use service::ChatService;
pub use types::{SayRequest, SayResponse};

use crate::validation::Validator;

/// Fully qualified service name.
pub const SERVICE: &str = "chat.v1.ChatService";

/// Procedure identifier of `Say`.
pub const SAY_PROCEDURE: &str = "/chat.v1.ChatService/Say";

/// Validator with the rule sets of every chat message.
pub fn validator() -> Validator {
    Validator::builder()
        .register::<SayRequest>()
        .register::<SayResponse>()
        .build()
}

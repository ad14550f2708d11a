//! Client for `chat.v1.ChatService` over its JSON transport.

mod client;

pub use client::{
    ChatClient, ClientError, RpcStatus, SayRequest, SayResponse, ViolationDetail, SAY_PATH,
    TIMEOUT_HEADER,
};

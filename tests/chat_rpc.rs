//! End-to-end calls against a running chat server.

use std::time::{Duration, Instant};

use chat_rpc::chat::{SayRequest, SayResponse, SAY_PROCEDURE};
use chat_rpc::http::{Procedure, RpcServer};
use chat_rpc::message::AnyMessage;
use chat_rpc::rpc::{unary_fn, InterceptorChain, LoggingInterceptor, RpcError};
use chat_sdk::{ChatClient, ClientError, SAY_PATH, TIMEOUT_HEADER};

mod common;

#[tokio::test]
async fn say_hello() {
    let server = common::start_chat_server().await;

    let resp = server.client().say("Hello").await.unwrap();
    assert_eq!(resp.sentence, "You said Hello");
    assert!(resp.responded_at.is_some());

    server.stop().await;
}

#[tokio::test]
async fn say_keeps_whitespace() {
    let server = common::start_chat_server().await;

    let resp = server.client().say("Hello World").await.unwrap();
    assert_eq!(resp.sentence, "You said Hello World");

    let resp = server.client().say("Hello, world!").await.unwrap();
    assert_eq!(resp.sentence, "You said Hello, world!");

    server.stop().await;
}

#[tokio::test]
async fn empty_sentence_is_invalid_argument() {
    let server = common::start_chat_server().await;

    let err = server.client().say("").await.unwrap_err();
    let ClientError::Rpc(status) = err else {
        panic!("expected an rpc error, got {err:?}");
    };
    assert_eq!(status.code, "invalid_argument");
    assert!(status.message.starts_with("validation error:"));
    assert_eq!(status.details.len(), 1);
    assert_eq!(status.details[0].field, "sentence");
    assert_eq!(status.details[0].rule, "string.min_len");

    server.stop().await;
}

#[tokio::test]
async fn zero_timeout_is_deadline_exceeded() {
    let server = common::start_chat_server().await;

    let err = server
        .client()
        .with_timeout(Duration::ZERO)
        .say("Hello")
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("deadline_exceeded"));

    server.stop().await;
}

#[tokio::test]
async fn say_over_h2c_prior_knowledge() {
    let server = common::start_chat_server().await;
    let h2 = reqwest::Client::builder()
        .no_proxy()
        .http2_prior_knowledge()
        .build()
        .unwrap();

    let resp = ChatClient::with_client(&server.url(), h2)
        .say("Hello")
        .await
        .unwrap();
    assert_eq!(resp.sentence, "You said Hello");

    server.stop().await;
}

#[tokio::test]
async fn client_disconnect_cancels_call() {
    let (logs, _guard) = common::LogCapture::install("chat_rpc::rpc::logging");

    let hang = unary_fn(|_ctx, _msg| std::future::pending::<Result<AnyMessage, RpcError>>());
    let router = RpcServer::new(&common::test_config())
        .with_interceptors(InterceptorChain::new().with(LoggingInterceptor::new()))
        .register(Procedure::unary::<SayRequest, SayResponse>(SAY_PROCEDURE, hang))
        .into_router();
    let server = common::start_server(router).await;

    let impatient = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_millis(500))
        .build()
        .unwrap();
    let err = impatient
        .post(format!("{}{}", server.url(), SAY_PATH))
        .json(&serde_json::json!({"sentence": "Hello"}))
        .send()
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    server.wait_for_in_flight(0).await;

    assert_eq!(logs.with_message("start processing request").len(), 1);
    assert!(logs.with_message("finished").is_empty());
    let exits = logs.with_message("finished with error");
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0]["code"], "canceled");
    assert_eq!(exits[0]["error"], "call abandoned before completion");

    server.stop().await;
}

#[tokio::test]
async fn missing_field_is_validated_not_rejected() {
    let server = common::start_chat_server().await;

    let res = common::http_client()
        .post(format!("{}{}", server.url(), SAY_PATH))
        .header("content-type", "application/json")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], "invalid_argument");
    assert_eq!(body["details"][0]["field"], "sentence");

    server.stop().await;
}

#[tokio::test]
async fn transport_rejections() {
    let server = common::start_chat_server().await;
    let client = common::http_client();
    let url = format!("{}{}", server.url(), SAY_PATH);

    let res = client
        .post(&url)
        .header("content-type", "application/json")
        .body("{\"sentence\":")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = client
        .post(&url)
        .header("content-type", "text/plain")
        .body("Hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 415);

    let res = client
        .post(&url)
        .header(TIMEOUT_HEADER, "soon")
        .json(&serde_json::json!({"sentence": "Hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 405);

    server.stop().await;
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let server = common::start_chat_server().await;

    let concurrency = 20;
    let requests_per_task = 10;
    let start = Instant::now();

    let mut tasks = Vec::new();
    for task in 0..concurrency {
        let client = server.client();
        tasks.push(tokio::spawn(async move {
            let mut ok = 0;
            for i in 0..requests_per_task {
                let sentence = format!("task {task} call {i}");
                let resp = client.say(&sentence).await.unwrap();
                assert_eq!(resp.sentence, format!("You said {sentence}"));
                ok += 1;
            }
            ok
        }));
    }

    let mut total = 0;
    for task in tasks {
        total += task.await.unwrap();
    }
    assert_eq!(total, concurrency * requests_per_task);

    println!(
        "{} calls in {:?} ({} concurrent tasks)",
        total,
        start.elapsed(),
        concurrency
    );

    server.stop().await;
}

use std::process::ExitCode;
use std::time::Duration;

use chat_sdk::{ChatClient, ClientError};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chat-cli")]
#[command(about = "Command-line client for the chat RPC service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Per-call timeout sent to the server, in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a sentence and print the echo
    Say {
        #[arg(default_value = "Hello, world!")]
        sentence: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut client = ChatClient::new(&cli.url)
        .with_user_agent(concat!("chat-cli/", env!("CARGO_PKG_VERSION")));
    if let Some(ms) = cli.timeout_ms {
        client = client.with_timeout(Duration::from_millis(ms));
    }

    match cli.command {
        Commands::Say { sentence } => match client.say(&sentence).await {
            Ok(resp) => match serde_json::to_string_pretty(&resp) {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("Error: failed to format response: {}", err);
                    ExitCode::FAILURE
                }
            },
            Err(err) => {
                eprintln!("Error: {}", err);
                if let ClientError::Rpc(status) = &err {
                    for detail in &status.details {
                        eprintln!("  {}: {} [{}]", detail.field, detail.message, detail.rule);
                    }
                }
                ExitCode::FAILURE
            }
        },
    }
}

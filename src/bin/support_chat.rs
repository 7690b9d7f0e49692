//! Terminal chat front end.
//!
//! Startup is eager: the index is built (or reopened) before the first
//! prompt is printed, so the first question is as fast as any other. One
//! session memory lives for the life of the process; `/clear` resets it.

use std::sync::Arc;

use rig::client::{CompletionClient, EmbeddingsClient};
use rig::providers::openai;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use helpsmith::config::{BotConfig, openai_api_key};
use helpsmith::memory::SessionMemory;
use helpsmith::pipeline::SupportBot;
use helpsmith::retriever::RigCompletion;
use helpsmith::types::BotError;

#[tokio::main]
async fn main() -> Result<(), BotError> {
    init_tracing();

    let config = BotConfig::from_env()?;
    let api_key = openai_api_key()?;
    let client: openai::Client =
        openai::Client::new(&api_key).map_err(|err| BotError::Config(err.to_string()))?;
    let embedding_model = client.embedding_model(&config.embedding_model);
    let completion = Arc::new(RigCompletion::new(
        client.completion_model(&config.completion_model),
    ));

    println!("Preparing the support index, this can take a while on a first run...");
    let bot = SupportBot::initialize(config, embedding_model, completion).await?;
    println!("Ready. Ask about anything covered by our support articles.");
    println!("Commands: /clear starts a fresh conversation, /quit exits.\n");

    let mut memory = SessionMemory::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                memory.clear();
                println!("(conversation cleared)\n");
            }
            question => {
                let answer = bot.ask(question, &mut memory).await;
                println!("bot> {answer}\n");
            }
        }
    }

    println!("Bye!");
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

//! Console chat against a FastGPT application
//!
//! Streams one answer, answers an interactive prompt if the flow asks for
//! one, then lists the app's recent chats.
//!
//! Run with:
//!   FASTGPT_CONFIG=fastgpt.yaml cargo run --example console_chat -- support "Hello"
//!
//! or without a config file:
//!   FASTGPT_HOST=https://fastgpt.example.com FASTGPT_API_KEY=fastgpt-xxx \
//!     cargo run --example console_chat -- "" "Hello"

use anyhow::{bail, Context, Result};
use fastgpt_core::interactive::InteractiveAnswer;
use fastgpt_core::protocol::{Interactive, Variables, USER_INPUT, USER_SELECT};
use fastgpt_core::sse::EventPayload;
use fastgpt_core::{CancellationToken, ChatEventStream, ChatService, FastGptConfig, TurnOptions};
use futures::StreamExt;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn load_config() -> Result<FastGptConfig> {
    if let Ok(path) = std::env::var("FASTGPT_CONFIG") {
        return fastgpt_core::load_from_path(&path)
            .with_context(|| format!("loading configuration from {}", path));
    }

    let host = std::env::var("FASTGPT_HOST").context("FASTGPT_HOST or FASTGPT_CONFIG must be set")?;
    let key = std::env::var("FASTGPT_API_KEY").context("FASTGPT_API_KEY must be set")?;
    Ok(FastGptConfig::new(host, key))
}

/// Print the answer as it streams; returns the last interactive prompt, if any
async fn print_events(mut events: ChatEventStream) -> Result<Option<Interactive>> {
    let mut prompt = None;
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) if e.is_recoverable() => {
                eprintln!("\n[skipped event: {}]", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match event.payload {
            EventPayload::Answer(delta) => {
                print!("{}", delta.content());
                io::stdout().flush()?;
            }
            EventPayload::FlowNodeStatus(status) => {
                eprintln!("[{}: {}]", status.name, status.status)
            }
            EventPayload::ToolCall(call) => eprintln!("[tool: {}]", call.tool_name),
            EventPayload::Error(err) => eprintln!("[error: {}]", err.message),
            EventPayload::Interactive(interactive) => prompt = Some(interactive),
            _ => {}
        }
    }
    println!();
    Ok(prompt)
}

fn read_line(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn ask(prompt: &Interactive) -> Result<InteractiveAnswer> {
    println!("{}", prompt.params.description);
    match prompt.kind.as_str() {
        USER_SELECT => {
            for option in prompt.params.user_select_options.iter().flatten() {
                println!("  - {}", option.value);
            }
            Ok(InteractiveAnswer::select(read_line("choice")?))
        }
        USER_INPUT => {
            let mut form = Variables::new();
            for field in prompt.params.input_form.iter().flatten() {
                let value = read_line(&field.label)?;
                if !value.is_empty() {
                    form.insert(field.key.clone(), value.into());
                }
            }
            Ok(InteractiveAnswer::form(form))
        }
        other => bail!("cannot answer interactive type {}", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let app = args.next().unwrap_or_default();
    let message = args.next().unwrap_or_else(|| "你好，请介绍一下自己".to_string());

    let service = ChatService::from_config(load_config()?)?;
    let chat_id = ChatService::generate_chat_id();
    println!("chat id: {}", chat_id);

    let events = service
        .chat_stream_text(&app, message, TurnOptions::new().with_chat_id(&chat_id))
        .await?;

    if let Some(prompt) = print_events(events).await? {
        let answer = ask(&prompt)?;
        let events = service
            .chat_stream_interactive(&app, &prompt, &chat_id, &answer, TurnOptions::new())
            .await?;
        print_events(events).await?;
    }

    if !app.is_empty() {
        let page = service
            .get_histories(&app, 0, 5, Some("api"), &CancellationToken::new())
            .await?;
        println!("{} stored chats", page.total);
        for item in page.list {
            println!("  {}  {}", item.chat_id, item.display_title());
        }
    }

    Ok(())
}

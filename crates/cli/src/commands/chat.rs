//! `ctxkeeper chat` — Single-message or interactive chat for one participant.

use super::runtime::{CmdResult, Runtime};
use ctxkeeper_agent::{ChatService, TurnError};
use ctxkeeper_core::message::{GroupId, ParticipantId, SessionKey};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    config_path: Option<&Path>,
    group: GroupId,
    participant: ParticipantId,
    message: Option<String>,
) -> CmdResult {
    let runtime = Runtime::open(config_path).await?;
    let service = runtime.chat_service()?;
    let key = SessionKey::new(group, participant);

    if service.model().is_none() {
        eprintln!();
        eprintln!("  ERROR: No model configured!");
        eprintln!();
        eprintln!("  Set llm.model in your config file or CTXKEEPER_MODEL, e.g.");
        eprintln!("    model = \"deepseek-r1:8b\"");
        eprintln!();
        return Err(TurnError::ModelNotConfigured.into());
    }

    if let Some(msg) = message {
        // Single message mode
        let reply = service.handle_turn(key, &msg).await?;
        if let Some(warning) = &reply.persistence_warning {
            eprintln!("  [Warning] reply not saved: {warning}");
        }
        println!("{}", reply.content);
        return Ok(());
    }

    println!();
    println!("  ctxkeeper — session {key}");
    println!("  Model:    {}", service.model().unwrap_or_default());
    println!("  Budget:   {} tokens", runtime.config.llm.context_length);
    println!("  History:  {} messages", runtime.store.len(key).await);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    interactive(&service, key).await?;

    println!();
    println!("  Goodbye!");
    Ok(())
}

async fn interactive(service: &ChatService, key: SessionKey) -> CmdResult {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "exit" || text == "quit" {
            break;
        }

        match service.handle_turn(key, text).await {
            Ok(reply) => {
                println!();
                for line in reply.content.lines() {
                    println!("  Assistant > {line}");
                }
                if reply.trims > 0 {
                    println!("  (dropped {} oldest exchange(s) to fit)", reply.trims);
                }
                if let Some(warning) = reply.persistence_warning {
                    eprintln!("  [Warning] reply not saved: {warning}");
                }
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    Ok(())
}

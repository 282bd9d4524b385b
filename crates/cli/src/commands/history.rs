//! `ctxkeeper history` — Print a participant's stored history.

use super::runtime::{CmdResult, Runtime};
use ctxkeeper_core::message::{GroupId, ParticipantId, SessionKey};
use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    group: GroupId,
    participant: ParticipantId,
    json: bool,
) -> CmdResult {
    let runtime = Runtime::open(config_path).await?;
    let key = SessionKey::new(group, participant);
    let history = runtime.store.get(key).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No history for session {key}.");
        return Ok(());
    }

    println!("Session {key} — {} messages\n", history.len());
    for (i, message) in history.iter().enumerate() {
        let preview: String = message.content.chars().take(120).collect();
        let ellipsis = if message.content.chars().count() > 120 { "…" } else { "" };
        println!("  {i:>3}. [{}] {preview}{ellipsis}", message.role);
    }

    Ok(())
}

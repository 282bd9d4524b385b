//! `ctxkeeper sessions` — List stored sessions.

use super::runtime::{CmdResult, Runtime};
use ctxkeeper_core::message::SessionKey;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> CmdResult {
    let runtime = Runtime::open(config_path).await?;

    println!("Sessions");
    println!("========");
    println!("  Storage:  {}", runtime.config.storage.path.display());
    println!(
        "  Loaded:   {} ({} skipped)",
        runtime.report.loaded, runtime.report.skipped
    );
    println!();

    let groups = runtime.store.groups().await;
    if groups.is_empty() {
        println!("  No sessions stored yet.");
        return Ok(());
    }

    for group in groups {
        println!("  Group {group}");
        for participant in runtime.store.participants(group).await {
            let len = runtime.store.len(SessionKey::new(group, participant)).await;
            println!("    participant {participant:<20} {len} messages");
        }
    }

    Ok(())
}

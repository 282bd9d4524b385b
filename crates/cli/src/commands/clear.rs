//! `ctxkeeper clear` — Forget stored history, in memory and on disk.

use super::runtime::{CmdResult, Runtime};
use ctxkeeper_core::message::{GroupId, ParticipantId, SessionKey};
use std::path::Path;

/// What to forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Participant(GroupId, ParticipantId),
    Group(GroupId),
    Everything { confirm: bool },
}

pub async fn run(config_path: Option<&Path>, target: Target) -> CmdResult {
    if target == (Target::Everything { confirm: false }) {
        println!("This will delete ALL stored conversations permanently.");
        println!("  Run with --confirm to proceed:");
        println!("  ctxkeeper clear --everything --confirm");
        return Ok(());
    }

    let runtime = Runtime::open(config_path).await?;
    let store = &runtime.store;

    match target {
        Target::Participant(group, participant) => {
            let key = SessionKey::new(group, participant);
            if runtime.persistence.forget(store, key).await? {
                println!("Cleared session {key}.");
            } else {
                println!("No stored history for session {key}.");
            }
        }
        Target::Group(group) => {
            if runtime.persistence.forget_group(store, group).await? {
                println!("Cleared every session in group {group}.");
            } else {
                println!("No stored history for group {group}.");
            }
        }
        Target::Everything { .. } => {
            let groups = runtime.persistence.forget_all(store).await?;
            println!("Cleared {groups} group(s).");
        }
    }

    Ok(())
}

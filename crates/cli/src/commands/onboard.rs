//! `ctxkeeper onboard` — First-time setup.

use super::runtime::{CmdResult, load_config};
use ctxkeeper_config::AppConfig;
use ctxkeeper_memory::FileStorage;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> CmdResult {
    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => AppConfig::config_dir().join("config.toml"),
    };

    println!("ctxkeeper — First-Time Setup");
    println!("============================\n");

    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("  Created config directory: {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete and re-run onboard.");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("  Created config at: {}", config_path.display());
    }

    let config = load_config(Some(&config_path))?;
    let storage = FileStorage::new(&config.storage.path);
    storage.init().await?;
    println!("  Storage root: {}", storage.root().display());

    println!("\nNext steps:");
    println!("  1. Set llm.model in {} (or CTXKEEPER_MODEL)", config_path.display());
    println!("  2. Run: ctxkeeper chat -g 1 -p 1\n");

    Ok(())
}

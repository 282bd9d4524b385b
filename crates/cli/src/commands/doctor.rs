//! `ctxkeeper doctor` — Diagnose config, storage and backend health.

use super::runtime::{CmdResult, build_provider, build_tokenizer, load_config};
use ctxkeeper_config::AppConfig;
use ctxkeeper_memory::{ContextStore, FileStorage, Persistence};
use std::path::Path;
use std::sync::Arc;

pub async fn run(config_path: Option<&Path>) -> CmdResult {
    println!("ctxkeeper Doctor — System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    let default_path = AppConfig::config_dir().join("config.toml");
    let path = config_path.unwrap_or(&default_path);
    if !path.exists() {
        println!("  ⚠️  No config file at {} — run `ctxkeeper onboard`", path.display());
        issues += 1;
    }

    let config = match load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  1 blocking issue found.");
            return Ok(());
        }
    };

    match &config.llm.model {
        Some(model) => println!("  ✅ Model: {model}"),
        None => {
            println!("  ❌ No model configured — set llm.model or CTXKEEPER_MODEL");
            issues += 1;
        }
    }

    match build_tokenizer(&config.tokenizer) {
        Ok(tokenizer) => match tokenizer.count_tokens("user: ping\n").await {
            Ok(_) => println!("  ✅ Tokenizer: {}", tokenizer.name()),
            Err(e) => {
                println!("  ❌ Tokenizer {}: {e}", tokenizer.name());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Tokenizer: {e}");
            issues += 1;
        }
    }

    let persistence = Persistence::new(Arc::new(FileStorage::new(&config.storage.path)));
    if config.storage.path.is_dir() {
        match persistence.load_all(&ContextStore::new()).await {
            Ok(report) if report.skipped == 0 => {
                println!(
                    "  ✅ Storage {}: {} session(s)",
                    config.storage.path.display(),
                    report.loaded
                );
            }
            Ok(report) => {
                println!(
                    "  ⚠️  Storage {}: {} session(s), {} unreadable record(s) skipped",
                    config.storage.path.display(),
                    report.loaded,
                    report.skipped
                );
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Storage: {e}");
                issues += 1;
            }
        }
    } else {
        println!(
            "  ⚠️  No storage root at {} (created on first reply)",
            config.storage.path.display()
        );
    }

    let provider = build_provider(&config)?;
    if matches!(provider.health_check().await, Ok(true)) {
        println!("  ✅ Backend reachable: {}", config.llm.api_url);
        if let Ok(models) = provider.list_models().await {
            if let Some(model) = &config.llm.model {
                if !models.is_empty() && !models.iter().any(|m| m == model) {
                    println!("  ⚠️  Backend does not list model {model}");
                    issues += 1;
                }
            }
        }
    } else {
        println!("  ❌ Backend unreachable: {}", config.llm.api_url);
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

#![windows_subsystem = "windows"]
use std::io::{self, BufRead, Write};
use std::panic::AssertUnwindSafe;

use tracing_subscriber::EnvFilter;

use bunrei_core::config::{CoreConfig, LOG_ENV};
use bunrei_core::protocol;
use bunrei_core::{FileSettingsStore, GeminiProvider, Session};

fn init_logging() {
    // stdout carries protocol responses, so logs go to stderr.
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn main() {
    init_logging();

    let cfg = CoreConfig::from_env();

    let provider = match GeminiProvider::from_config(&cfg) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "failed to build http client");
            std::process::exit(1);
        }
    };

    let store = FileSettingsStore::in_dir(&cfg.settings_dir);
    let mut session = match Session::from_config(provider, store, &cfg) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to load settings");
            std::process::exit(1);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        settings = %cfg.settings_dir.display(),
        model = %cfg.generation_model,
        "bunrei-core ready"
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };

        if line.trim().is_empty() {
            continue;
        }

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| protocol::handle(&mut session, &line)));

        let response = match result {
            Ok(resp) => resp,
            Err(_) => {
                tracing::error!("handler panicked");
                serde_json::json!({
                    "status": "error",
                    "code": "internal",
                    "message": "internal core error"
                })
                .to_string()
            }
        };

        if writeln!(stdout, "{response}").is_err() {
            break;
        }

        let _ = stdout.flush();
    }
}

use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use focustimer_core::{Config, ExportBundle, NullNotifier, SessionStore, TimerEngine};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List stored sessions, oldest first
    List {
        /// Only show the most recent N sessions
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Export settings and sessions as JSON
    Export {
        /// Output file (default: focustimer-stats-<date>.json in the current directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Delete all stored sessions
    Clear {
        /// Required to actually delete
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: SessionsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open_store(config)?;

    match action {
        SessionsAction::List { limit } => {
            let sessions = db.load_sessions()?;
            let skip = limit.map_or(0, |n| sessions.len().saturating_sub(n));
            super::print_json(&sessions[skip..])?;
        }
        SessionsAction::Export { output } => {
            let bundle = ExportBundle::collect(&db, Utc::now())?;
            let path = output.unwrap_or_else(|| PathBuf::from(bundle.file_name()));
            std::fs::write(&path, serde_json::to_string_pretty(&bundle)?)?;
            println!("{}", path.display());
        }
        SessionsAction::Clear { yes } => {
            if !yes {
                return Err("refusing to delete session history without --yes".into());
            }
            let mut engine = TimerEngine::new(db, NullNotifier)?;
            engine.clear_history()?;
            println!("session history cleared");
        }
    }
    Ok(())
}

use clap::Subcommand;
use focustimer_core::storage::load_settings_or_default;
use focustimer_core::{Config, NullNotifier, Settings, TimerEngine};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Get a setting (e.g. "workDuration", "autoStartBreaks"; snake_case also works)
    Get { key: String },
    /// Set a setting; durations are in seconds
    Set { key: String, value: String },
    /// List all settings
    List,
    /// Restore default settings
    Reset,
}

pub fn run(action: SettingsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open_store(config)?;

    match action {
        SettingsAction::Get { key } => {
            let settings = load_settings_or_default(&db)?;
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown setting: {key}").into()),
            }
        }
        SettingsAction::Set { key, value } => {
            let mut engine = TimerEngine::new(db, NullNotifier)?;
            let updated = engine.settings().with_value(&key, &value)?;
            engine.update_settings(updated)?;
            println!("ok");
        }
        SettingsAction::List => {
            super::print_json(&load_settings_or_default(&db)?)?;
        }
        SettingsAction::Reset => {
            let mut engine = TimerEngine::new(db, NullNotifier)?;
            engine.update_settings(Settings::default())?;
            println!("settings reset to defaults");
        }
    }
    Ok(())
}

pub mod config;
pub mod sessions;
pub mod settings;
pub mod stats;
pub mod timer;

use focustimer_core::{Config, Database};

/// Open the session database named by the config.
pub fn open_store(config: &Config) -> Result<Database, Box<dyn std::error::Error>> {
    let path = config.database_path()?;
    Ok(Database::open_at(&path)?)
}

pub fn print_json<T: serde::Serialize + ?Sized>(
    value: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

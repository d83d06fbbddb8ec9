use chrono::Local;
use clap::Subcommand;
use focustimer_core::{Config, StatsAggregator};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// This week's stats (weeks start on Sunday)
    Week,
    /// All-time stats
    All,
    /// Today, week and all-time together
    Report,
}

pub fn run(action: StatsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open_store(config)?;
    let stats = StatsAggregator::load(&db)?;
    let now = Local::now();

    match action {
        StatsAction::Today => super::print_json(&stats.today(&now))?,
        StatsAction::Week => super::print_json(&stats.week(&now))?,
        StatsAction::All => super::print_json(&stats.all_time(&Local))?,
        StatsAction::Report => super::print_json(&stats.report(&now))?,
    }
    Ok(())
}

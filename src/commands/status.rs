use anyhow::Result;
use chrono::NaiveDate;

use pinwheel::catalog::DirectoryCatalog;
use pinwheel::config::Config;
use pinwheel::rotation::RotationEngine;
use pinwheel::utils::truncate_text;

use super::today_or;

const IDENTIFIER_WIDTH: usize = 48;

pub fn status(config: &Config, date: Option<NaiveDate>, recent: usize) -> Result<()> {
    let engine = RotationEngine::new(config);
    let catalog = DirectoryCatalog::from(&config.catalog);
    let report = engine.inspect(&catalog, today_or(date));

    println!("Rotation Status");
    println!("===============");
    print!("{}", report.render());

    if recent > 0 && !report.recent.is_empty() {
        println!("\nRecent Emissions");
        println!("----------------");
        for record in report.recent.iter().take(recent) {
            println!(
                "  {}  {:<width$}  {}",
                record.emitted_at.format("%Y-%m-%d %H:%M"),
                truncate_text(&record.identifier, IDENTIFIER_WIDTH),
                record.episode,
                width = IDENTIFIER_WIDTH,
            );
        }
    }

    Ok(())
}

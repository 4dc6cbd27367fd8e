use anyhow::{Context, Result};

use pinwheel::analytics::DistributionReport;
use pinwheel::catalog::{CatalogSource, DirectoryCatalog};
use pinwheel::config::Config;
use pinwheel::error::Error;

pub fn analyze(config: &Config) -> Result<()> {
    let catalog = DirectoryCatalog::from(&config.catalog);
    let items = catalog.list().context("Failed to enumerate catalog")?;
    if items.is_empty() {
        return Err(Error::empty_catalog(catalog.describe()).into());
    }

    println!("Found {} media files in {}\n", items.len(), catalog.describe());
    print!("{}", DistributionReport::analyze(&items));
    Ok(())
}

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use pinwheel::catalog::DirectoryCatalog;
use pinwheel::config::Config;
use pinwheel::rotation::RotationEngine;

use super::today_or;

/// Run one selection and print where the chosen item lives
///
/// Plain output is the absolute location on the first line and the status
/// line on the second, so scripts can read the first line only.
pub fn select(
    config: &Config,
    date: Option<NaiveDate>,
    previous: Option<String>,
    json: bool,
    seed: Option<u64>,
) -> Result<()> {
    let engine = RotationEngine::new(config);
    let catalog = DirectoryCatalog::from(&config.catalog);
    let today = today_or(date);

    let mut rng: Box<dyn RngCore> = match seed {
        Some(seed) => Box::new(ChaCha8Rng::seed_from_u64(seed)),
        None => Box::new(rand::thread_rng()),
    };

    let result = match engine.run(&catalog, today, previous.as_deref(), &mut *rng) {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(
                category = err.category().label(),
                recoverable = err.is_recoverable(),
                error = %err,
                "Selection failed"
            );
            return Err(err).with_context(|| {
                format!("Selection failed for catalog {}", config.catalog.directory.display())
            });
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.absolute_location.display());
        println!("{}", result.diagnostic_summary);
    }

    if !result.persisted {
        tracing::warn!("Rotation state was not saved; the next run may repeat recent items");
    }

    Ok(())
}

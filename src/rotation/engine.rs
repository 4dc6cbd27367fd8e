//! One end-to-end invocation
//!
//! Load both documents once, plan, commit, save both documents once. Only an
//! empty or unreadable catalog fails the invocation; a failed save is logged
//! and the selection is still returned.

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::Serialize;
use std::path::PathBuf;

use super::clustering::{ClusteringGuard, SelectionStage};
use super::seasonal::SeasonalMode;
use super::selector::{commit, excluded_percent, SelectionPlan, Selector};
use super::tracker::{RotationPolicy, RotationState, RotationTracker};
use crate::catalog::CatalogSource;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::{EmissionRecord, JsonStore, PersistedDocument, RecentEmissionsLog, StorageResult};
use crate::utils::format_bytes;

/// What the publisher receives
#[derive(Debug, Clone, Serialize)]
pub struct SelectionResult {
    /// Chosen item identifier
    pub identifier: String,

    /// Absolute path of the chosen item
    pub absolute_location: PathBuf,

    /// Status line for operators
    pub diagnostic_summary: String,

    /// Episode tag of the chosen item
    pub episode: String,

    /// Ladder stage that produced the choice
    pub stage: SelectionStage,

    /// Whether this invocation started a new cycle
    pub cycle_reset: bool,

    /// Whether both documents were written
    pub persisted: bool,
}

/// Format the operator status line
pub fn status_line(
    pool_size: usize,
    excluded: usize,
    mode: &SeasonalMode,
    cycle_emission_count: u64,
) -> String {
    let percent = excluded_percent(pool_size, excluded);
    format!(
        "pool={pool_size} excluded={excluded} ({percent:.1}%) season={mode} cycle={cycle_emission_count}"
    )
}

/// Rotation engine bound to two storage locations
#[derive(Debug, Clone)]
pub struct RotationEngine {
    selector: Selector,
    policy: RotationPolicy,
    state_store: JsonStore,
    history_store: JsonStore,
    history_capacity: usize,
}

impl RotationEngine {
    /// Build an engine from validated configuration
    pub fn new(config: &Config) -> Self {
        let selector = Selector::new(
            config.seasonal.clone(),
            ClusteringGuard::from(&config.clustering),
            config.selection.clone(),
        );
        Self {
            selector,
            policy: config.rotation.clone(),
            state_store: JsonStore::new(&config.storage.state_path, config.storage.max_bytes),
            history_store: JsonStore::new(&config.storage.history_path, config.storage.max_bytes),
            history_capacity: config.storage.history_capacity,
        }
    }

    /// Rotation state store
    pub fn state_store(&self) -> &JsonStore {
        &self.state_store
    }

    /// Recent-emissions store
    pub fn history_store(&self) -> &JsonStore {
        &self.history_store
    }

    /// Load the rotation state, recovering from corruption
    pub fn load_tracker(&self) -> RotationTracker {
        let state: RotationState = self.state_store.load();
        RotationTracker::new(self.policy.clone(), state)
    }

    /// Load the recent-emissions log, recovering from corruption
    pub fn load_history(&self) -> RecentEmissionsLog {
        let mut log: RecentEmissionsLog = self.history_store.load();
        log.set_capacity(self.history_capacity);
        log
    }

    /// Run one invocation against a catalog source
    pub fn run<C, R>(
        &self,
        source: &C,
        today: NaiveDate,
        previous: Option<&str>,
        rng: &mut R,
    ) -> Result<SelectionResult>
    where
        C: CatalogSource + ?Sized,
        R: Rng + ?Sized,
    {
        let catalog = source.list()?;
        if catalog.is_empty() {
            return Err(Error::empty_catalog(source.describe()));
        }

        let mut tracker = self.load_tracker();
        let mut log = self.load_history();

        let plan = self
            .selector
            .plan(&catalog, today.month(), &tracker, &log, previous, rng)?;

        commit(&plan, &mut tracker, &mut log);
        let persisted = self.persist(&mut tracker, &mut log, plan.pool_size);

        let summary = status_line(
            plan.pool_size,
            plan.excluded,
            &plan.mode,
            tracker.state().cycle_emission_count,
        );
        tracing::info!(
            identifier = %plan.identifier,
            episode = %plan.episode,
            stage = %plan.stage,
            candidates = plan.candidates,
            status = %summary,
            "Item selected"
        );

        Ok(self.result(source, plan, summary, persisted))
    }

    fn result<C: CatalogSource + ?Sized>(
        &self,
        source: &C,
        plan: SelectionPlan,
        summary: String,
        persisted: bool,
    ) -> SelectionResult {
        SelectionResult {
            absolute_location: source.locate(&plan.identifier),
            identifier: plan.identifier,
            diagnostic_summary: summary,
            episode: plan.episode,
            stage: plan.stage,
            cycle_reset: plan.reset.is_some(),
            persisted,
        }
    }

    /// Save both documents, logging failures instead of returning them
    fn persist(
        &self,
        tracker: &mut RotationTracker,
        log: &mut RecentEmissionsLog,
        pool_size: usize,
    ) -> bool {
        tracker.enforce_cap(pool_size);

        let saved_state = self.state_store.save(tracker.state_mut());
        let saved_history = self.history_store.save(log);

        report_save(&self.state_store, saved_state) & report_save(&self.history_store, saved_history)
    }
}

/// Health of one persisted document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentStatus {
    /// Location on disk
    pub path: PathBuf,

    /// Size in bytes, if the file exists
    pub size: Option<u64>,

    /// Configured byte cap
    pub limit: u64,

    /// Why the document would be discarded on the next load
    pub problem: Option<String>,
}

impl DocumentStatus {
    fn probe<D: PersistedDocument>(store: &JsonStore) -> (Self, Option<D>) {
        let (doc, problem) = match store.try_load::<D>() {
            Ok(doc) => (doc, None),
            Err(e) => (None, Some(e.to_string())),
        };
        let status = Self {
            path: store.path().to_path_buf(),
            size: store.size_on_disk(),
            limit: store.max_bytes(),
            problem,
        };
        (status, doc)
    }

    fn render(&self) -> String {
        let size = match self.size {
            Some(bytes) => format!("{} of {}", format_bytes(bytes), format_bytes(self.limit)),
            None => String::from("missing"),
        };
        match &self.problem {
            Some(problem) => format!("{} ({size}) UNUSABLE: {problem}", self.path.display()),
            None => format!("{} ({size})", self.path.display()),
        }
    }
}

/// Read-only snapshot of the engine's persisted state
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    /// Rotation state document
    pub state: DocumentStatus,

    /// Recent-emissions document
    pub history: DocumentStatus,

    /// Eligible pool size today, if the catalog could be read
    pub pool_size: Option<usize>,

    /// Seasonal rule in force today
    pub mode: Option<SeasonalMode>,

    /// Fingerprints currently remembered
    pub remembered: usize,

    /// Memory size for today's pool
    pub cycle_size: Option<usize>,

    /// Emissions in the current cycle
    pub cycle_emission_count: u64,

    /// Pool size when the cycle began
    pub catalog_size_at_last_reset: usize,

    /// When the cycle began
    pub cycle_started_at: chrono::DateTime<chrono::Utc>,

    /// Most recent emission
    pub last_emission: Option<EmissionRecord>,

    /// Records in the recent-emissions log
    pub history_len: usize,

    /// Logged emissions, newest first
    pub recent: Vec<EmissionRecord>,
}

impl Diagnostics {
    /// Human-readable multi-line report
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("state:    {}\n", self.state.render()));
        out.push_str(&format!("history:  {}\n", self.history.render()));

        match (self.pool_size, &self.mode) {
            (Some(pool), Some(mode)) => {
                out.push_str(&format!("pool:     {pool} eligible (season={mode})\n"))
            }
            _ => out.push_str("pool:     catalog unreadable\n"),
        }

        let cycle_size = self
            .cycle_size
            .map(|n| n.to_string())
            .unwrap_or_else(|| String::from("?"));
        out.push_str(&format!(
            "cycle:    {} emitted since {}, remembering {}/{}, sized for {}\n",
            self.cycle_emission_count,
            self.cycle_started_at.format("%Y-%m-%d %H:%M UTC"),
            self.remembered,
            cycle_size,
            self.catalog_size_at_last_reset,
        ));

        match &self.last_emission {
            Some(last) => out.push_str(&format!(
                "last:     {} [{}] at {} ({} logged)\n",
                last.identifier,
                last.episode,
                last.emitted_at.format("%Y-%m-%d %H:%M UTC"),
                self.history_len,
            )),
            None => out.push_str("last:     none\n"),
        }
        out
    }
}

impl RotationEngine {
    /// Inspect persisted state without changing it
    ///
    /// An unreadable catalog is reported rather than returned as an error.
    pub fn inspect<C: CatalogSource + ?Sized>(&self, source: &C, today: NaiveDate) -> Diagnostics {
        let (state_status, state) = DocumentStatus::probe::<RotationState>(&self.state_store);
        let (history_status, history) =
            DocumentStatus::probe::<RecentEmissionsLog>(&self.history_store);
        let state = state.unwrap_or_default();
        let history = history.unwrap_or_default();

        let pool = match source.list() {
            Ok(catalog) => Some(self.selector.seasonal().eligible(&catalog, today.month())),
            Err(e) => {
                tracing::warn!(error = %e, "Catalog unreadable during inspection");
                None
            }
        };

        Diagnostics {
            state: state_status,
            history: history_status,
            pool_size: pool.as_ref().map(|p| p.len()),
            remembered: state.recent_fingerprints.len(),
            cycle_size: pool.as_ref().map(|p| self.policy.cycle_size(p.len())),
            cycle_emission_count: state.cycle_emission_count,
            catalog_size_at_last_reset: state.catalog_size_at_last_reset,
            cycle_started_at: state.cycle_started_at,
            last_emission: history.last().cloned(),
            mode: pool.map(|p| p.mode),
            history_len: history.len(),
            recent: history.recent(history.len()).cloned().collect(),
        }
    }
}

fn report_save(store: &JsonStore, outcome: StorageResult<u64>) -> bool {
    match outcome {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(
                path = %store.path().display(),
                recoverable = e.is_recoverable(),
                error = %e,
                "Failed to persist state; selection still reported"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tempfile::TempDir;

    fn engine_in(dir: &TempDir) -> RotationEngine {
        let mut config = Config::default();
        config.storage.state_path = dir.path().join("rotation_state.json");
        config.storage.history_path = dir.path().join("recent_emissions.json");
        config.clustering.window = 3;
        RotationEngine::new(&config)
    }

    fn march() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_status_line_format() {
        let line = status_line(200, 30, &SeasonalMode::Default, 31);
        assert_eq!(line, "pool=200 excluded=30 (15.0%) season=default cycle=31");
    }

    #[test]
    fn test_status_line_empty_pool() {
        let line = status_line(0, 0, &SeasonalMode::Default, 0);
        assert_eq!(line, "pool=0 excluded=0 (0.0%) season=default cycle=0");
    }

    #[test]
    fn test_run_persists_both_documents() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        let catalog = StaticCatalog::new(["S01E01-a.jpg", "S02E01-a.jpg"]).with_root("/media");
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let result = engine.run(&catalog, march(), None, &mut rng).unwrap();

        assert!(result.persisted);
        assert!(result.absolute_location.starts_with("/media"));
        assert!(result.diagnostic_summary.contains("pool=2"));

        let state: RotationState = engine.state_store().try_load().unwrap().unwrap();
        assert_eq!(state.recent_fingerprints.len(), 1);
        let log: RecentEmissionsLog = engine.history_store().try_load().unwrap().unwrap();
        assert_eq!(log.last().unwrap().identifier, result.identifier);
    }

    #[test]
    fn test_empty_catalog_fails() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        let catalog = StaticCatalog::new(Vec::<String>::new());
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let err = engine.run(&catalog, march(), None, &mut rng).unwrap_err();
        assert!(matches!(err, Error::EmptyCatalog { .. }));
        assert!(!engine.state_store().exists());
    }

    #[test]
    fn test_persistence_failure_still_selects() {
        let dir = TempDir::new().unwrap();
        // A regular file where the state directory should be
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut config = Config::default();
        config.storage.state_path = blocker.join("rotation_state.json");
        config.storage.history_path = blocker.join("recent_emissions.json");
        let engine = RotationEngine::new(&config);

        let catalog = StaticCatalog::new(["a.jpg"]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = engine.run(&catalog, march(), None, &mut rng).unwrap();

        assert_eq!(result.identifier, "a.jpg");
        assert!(!result.persisted);
    }

    #[test]
    fn test_corrupt_state_recovers() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        std::fs::write(engine.state_store().path(), "{ not json").unwrap();
        std::fs::write(engine.history_store().path(), "[1, 2, 3]").unwrap();

        let catalog = StaticCatalog::new(["a.jpg", "b.jpg"]);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let result = engine.run(&catalog, march(), None, &mut rng).unwrap();
        assert!(result.persisted);

        let state: RotationState = engine.state_store().try_load().unwrap().unwrap();
        assert_eq!(state.format_version, RotationState::FORMAT_VERSION);
        assert_eq!(state.cycle_emission_count, 1);
    }

    #[test]
    fn test_inspect_does_not_write() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        let catalog = StaticCatalog::new(["a.jpg", "b.jpg", "c.jpg"]);

        let before = engine.inspect(&catalog, march());
        assert_eq!(before.pool_size, Some(3));
        assert_eq!(before.cycle_size, Some(3));
        assert!(before.last_emission.is_none());
        assert!(!engine.state_store().exists());

        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let result = engine.run(&catalog, march(), None, &mut rng).unwrap();

        let after = engine.inspect(&catalog, march());
        assert_eq!(after.remembered, 1);
        assert_eq!(after.cycle_emission_count, 1);
        assert_eq!(after.last_emission.as_ref().unwrap().identifier, result.identifier);
        assert!(after.render().contains("season=default"));
    }

    #[test]
    fn test_inspect_reports_corruption() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        std::fs::write(engine.state_store().path(), "garbage").unwrap();

        let report = engine.inspect(&StaticCatalog::new(["a.jpg"]), march());
        assert!(report.state.problem.is_some());
        assert!(report.history.problem.is_none());
        assert!(report.render().contains("UNUSABLE"));
        // inspection never repairs
        assert_eq!(std::fs::read_to_string(engine.state_store().path()).unwrap(), "garbage");
    }
}

//! Property tests for the selection pipeline

use pinwheel::rotation::episode::identify;
use pinwheel::rotation::{
    commit, ClusteringGuard, RotationPolicy, RotationState, RotationTracker, SeasonalMode,
    SeasonalRules, SelectionConfig, Selector,
};
use pinwheel::storage::{EmissionRecord, RecentEmissionsLog};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

fn item_name() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..4, 1u32..12, "[a-z]{1,6}").prop_map(|(s, e, t)| format!("S{s:02}E{e:02}-{t}.jpg")),
        (1u32..4, 1u32..12, 0u32..99).prop_map(|(s, e, n)| format!("{s}x{e:02} - {n}.png")),
        "[A-Za-z]{1,10}[_-][0-9]{1,3}\\.jpg",
        prop_oneof![Just("Halloween"), Just("xmas"), Just("Christmas")]
            .prop_flat_map(|k| "[a-z]{0,4}".prop_map(move |s| format!("{k}_{s}.jpg"))),
    ]
}

fn log_of(names: &[String]) -> RecentEmissionsLog {
    let mut log = RecentEmissionsLog::default();
    for name in names {
        log.push(EmissionRecord::now(name.as_str(), identify(name)));
    }
    log
}

proptest! {
    #[test]
    fn tag_is_deterministic_and_total(name in any::<String>()) {
        let tag = identify(&name);
        prop_assert!(!tag.is_empty());
        prop_assert_eq!(tag, identify(&name));
    }

    #[test]
    fn numbered_notations_agree(season in 0u32..100, episode in 0u32..100, suffix in "[a-z]{0,5}") {
        let expected = format!("S{season}E{episode}");
        prop_assert_eq!(identify(&format!("S{season:02}E{episode:02}-{suffix}.jpg")), expected.clone());
        prop_assert_eq!(identify(&format!("{season}x{episode:02}_{suffix}.png")), expected.clone());
        prop_assert_eq!(identify(&format!("Season {season} Episode {episode}.gif")), expected);
    }

    #[test]
    fn relaxation_is_monotonic(
        candidates in prop::collection::vec(item_name(), 0..30),
        history in prop::collection::vec(item_name(), 0..12),
        window in 1usize..8,
    ) {
        let log = log_of(&history);
        let refs: Vec<&str> = candidates.iter().map(String::as_str).collect();
        let guard = ClusteringGuard::new(window);

        let mut previous: Option<HashSet<&str>> = None;
        for (_, stage_window) in guard.ladder() {
            let admitted: HashSet<&str> =
                ClusteringGuard::filter(&refs, &log, stage_window).into_iter().collect();
            if let Some(previous) = &previous {
                prop_assert!(previous.is_subset(&admitted));
            }
            previous = Some(admitted);
        }
        prop_assert_eq!(previous.map(|s| s.len()), Some(refs.iter().collect::<HashSet<_>>().len()));
    }

    #[test]
    fn seasonal_filter_partitions(
        catalog in prop::collection::vec(item_name(), 1..40),
        month in 1u32..=12,
    ) {
        let rules = SeasonalRules::default();
        let pool = rules.eligible(&catalog, month);

        prop_assert!(!pool.is_empty());
        prop_assert!(pool.items.iter().all(|item| catalog.contains(item)));

        match &pool.mode {
            SeasonalMode::Default => {
                prop_assert!(rules.active_group(month).is_none());
                prop_assert!(pool.items.iter().all(|item| rules.classify(item).is_none()));
            }
            SeasonalMode::Active(group) => {
                prop_assert!(pool
                    .items
                    .iter()
                    .all(|item| rules.classify(item).map(|g| &g.name) == Some(group)));
            }
            SeasonalMode::Degraded(_) => prop_assert_eq!(&pool.items, &catalog),
        }
    }

    #[test]
    fn memory_stays_within_cycle_size(
        pool_size in 1usize..20_000,
        emissions in 1usize..400,
    ) {
        let mut tracker = RotationTracker::new(RotationPolicy::default(), RotationState::new());
        for i in 0..emissions {
            tracker.record_emission(&format!("item-{i}.jpg"), pool_size);
            prop_assert!(tracker.state().recent_fingerprints.len() <= tracker.cycle_size(pool_size));
        }
        prop_assert!(tracker.cycle_size(pool_size) <= 2000);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn no_repeat_until_exhaustion(
        names in prop::collection::hash_set("[a-z]{1,6}(_[0-9]{1,2})?\\.jpg", 1..=100),
        seed in any::<u64>(),
    ) {
        let catalog: Vec<String> = names.into_iter().collect();
        let selector = Selector::new(
            SeasonalRules::none(),
            ClusteringGuard::new(4),
            SelectionConfig::default(),
        );
        let mut tracker = RotationTracker::new(RotationPolicy::default(), RotationState::new());
        let mut log = RecentEmissionsLog::default();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut seen = HashSet::new();
        for _ in 0..catalog.len() {
            let plan = selector.plan(&catalog, 6, &tracker, &log, None, &mut rng).unwrap();
            prop_assert!(plan.reset.is_none());
            prop_assert!(seen.insert(plan.identifier.clone()), "repeated {}", plan.identifier);
            commit(&plan, &mut tracker, &mut log);
        }
        prop_assert_eq!(seen.len(), catalog.len());

        let next = selector.plan(&catalog, 6, &tracker, &log, None, &mut rng).unwrap();
        prop_assert!(next.reset.is_some());
    }
}

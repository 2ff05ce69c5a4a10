//! Monte Carlo trials
//!
//! Runs the same encounter many times with consecutive seeds. Trials run in
//! parallel; each builds its own encounter and random stream, so results do
//! not depend on scheduling.

mod tally;

pub use tally::{SideTally, TrialFailure, TrialReport};

use crate::config::SimConfig;
use crate::encounter::{Encounter, EncounterSpec, OutcomeRecord};
use crate::error::SimError;
use bestiary_core::Catalog;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, info_span, warn};

/// Receives completed outcomes in trial order
pub trait OutcomeSink {
    fn record(&mut self, index: usize, outcome: &OutcomeRecord);
}

impl OutcomeSink for Vec<OutcomeRecord> {
    fn record(&mut self, _index: usize, outcome: &OutcomeRecord) {
        self.push(outcome.clone());
    }
}

/// Shared flag that stops trials that have not started yet
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

enum TrialRun {
    Completed(OutcomeRecord),
    Failed(String),
    Cancelled,
}

/// Runs many independent encounters of one setup
pub struct TrialRunner<'a, C: Catalog + Sync> {
    catalog: &'a C,
    spec: EncounterSpec,
    config: SimConfig,
    cancel: CancelToken,
}

impl<'a, C: Catalog + Sync> TrialRunner<'a, C> {
    /// Validates the setup once, before any trial runs
    pub fn new(catalog: &'a C, spec: EncounterSpec, config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        spec.validate(catalog)?;
        Ok(TrialRunner {
            catalog,
            spec,
            config,
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn spec(&self) -> &EncounterSpec {
        &self.spec
    }

    /// A single encounter with the given seed
    pub fn run_trial(&self, seed: u64) -> Result<OutcomeRecord, SimError> {
        Encounter::from_catalog(self.catalog, &self.spec, &self.config, seed)?.run()
    }

    /// Run `trials` encounters seeded `seed`, `seed + 1`, ...
    pub fn run(&self, trials: usize, seed: u64) -> TrialReport {
        let mut report = TrialReport::new(self.spec.side_names(), trials, seed);
        self.run_into(trials, seed, &mut report, None::<&mut Vec<OutcomeRecord>>);
        report
    }

    /// Like [`run`](Self::run), also streaming every outcome to `sink`
    pub fn run_with_sink(&self, trials: usize, seed: u64, sink: &mut impl OutcomeSink) -> TrialReport {
        let mut report = TrialReport::new(self.spec.side_names(), trials, seed);
        self.run_into(trials, seed, &mut report, Some(sink));
        report
    }

    fn run_into<S: OutcomeSink>(
        &self,
        trials: usize,
        seed: u64,
        report: &mut TrialReport,
        mut sink: Option<&mut S>,
    ) {
        let span = info_span!("trials", trials, seed);
        let _enter = span.enter();

        let runs: Vec<TrialRun> = (0..trials)
            .into_par_iter()
            .map(|i| {
                if self.cancel.is_cancelled() {
                    return TrialRun::Cancelled;
                }
                match self.run_trial(seed.wrapping_add(i as u64)) {
                    Ok(outcome) => TrialRun::Completed(outcome),
                    Err(e) => TrialRun::Failed(e.to_string()),
                }
            })
            .collect();

        for (index, run) in runs.into_iter().enumerate() {
            let trial_seed = seed.wrapping_add(index as u64);
            match run {
                TrialRun::Completed(outcome) => {
                    report.record(index, &outcome);
                    if let Some(sink) = sink.as_deref_mut() {
                        sink.record(index, &outcome);
                    }
                }
                TrialRun::Failed(message) => {
                    warn!(index, seed = trial_seed, error = %message, "trial failed");
                    report.record_failure(index, trial_seed, message);
                }
                TrialRun::Cancelled => report.record_cancelled(),
            }
        }

        info!(
            completed = report.completed,
            failed = report.failures.len(),
            cancelled = report.cancelled,
            draws = report.draws,
            mean_rounds = report.mean_rounds(),
            "trials finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::SideSpec;
    use bestiary_core::{Bestiary, CatalogError, ContentKind, CreatureTemplate, HitPoints};
    use rules_core::{AbilityScores, Weapon};
    use std::sync::atomic::AtomicUsize;

    /// Loses every seventh creature lookup once `failing` is set
    struct FlakyCatalog {
        inner: Bestiary,
        lookups: AtomicUsize,
        failing: AtomicBool,
    }

    impl FlakyCatalog {
        fn new(inner: Bestiary) -> Self {
            FlakyCatalog {
                inner,
                lookups: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
            }
        }
    }

    impl Catalog for FlakyCatalog {
        fn get_creature_template(&self, name: &str) -> Result<&CreatureTemplate, CatalogError> {
            let lookup = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
            if self.failing.load(Ordering::SeqCst) && lookup % 7 == 0 {
                return Err(CatalogError::ContentNotFound {
                    kind: ContentKind::Creature,
                    name: name.to_string(),
                });
            }
            self.inner.get_creature_template(name)
        }

        fn get_weapon(&self, name: &str) -> Result<Arc<Weapon>, CatalogError> {
            self.inner.get_weapon(name)
        }

        fn creature_names(&self) -> Vec<&str> {
            self.inner.creature_names()
        }
    }

    fn weapon(id: &str, damage: &str) -> Weapon {
        Weapon::new(id, damage.parse().unwrap())
    }

    /// Expected number of attacks to deal `hp` damage with a +5 1d8+3
    /// attack against AC 13: miss 7/20, hit 12/20, critical 1/20
    fn expected_attacks(hp: usize) -> f64 {
        let (p_miss, p_hit, p_crit) = (0.35, 0.60, 0.05);
        let mut f = vec![0.0; hp + 1];
        let remaining = |f: &[f64], h: usize, d: usize| if d >= h { 0.0 } else { f[h - d] };
        for h in 1..=hp {
            let hit: f64 = (1..=8).map(|r| remaining(&f, h, r + 3)).sum::<f64>() / 8.0;
            let mut crit = 0.0;
            for a in 1..=8 {
                for b in 1..=8 {
                    crit += remaining(&f, h, a + b + 3);
                }
            }
            crit /= 64.0;
            f[h] = (1.0 + p_hit * hit + p_crit * crit) / (1.0 - p_miss);
        }
        f[hp]
    }

    fn knight_and_dummy() -> Bestiary {
        let mut bestiary = Bestiary::new();
        bestiary.insert_creature(
            CreatureTemplate::new(
                "knight",
                10,
                HitPoints::Fixed(1000),
                AbilityScores::new([16, 10, 10, 10, 10, 10]),
            )
            .with_attack(weapon("longsword", "1d8 slashing"))
            .with_attack_bonus(5),
        );
        bestiary.insert_creature(
            CreatureTemplate::new("dummy", 13, HitPoints::Fixed(10), AbilityScores::default())
                .with_attack(weapon("twig", "1 bludgeoning")),
        );
        bestiary
    }

    fn duelists() -> Bestiary {
        let mut bestiary = Bestiary::new();
        bestiary.insert_creature(
            CreatureTemplate::new(
                "duelist",
                13,
                HitPoints::Fixed(11),
                AbilityScores::new([14, 12, 12, 10, 10, 10]),
            )
            .with_attack(weapon("shortsword", "1d6 piercing")),
        );
        bestiary
    }

    #[test]
    fn test_mean_rounds_matches_expectation() {
        let bestiary = knight_and_dummy();
        let runner =
            TrialRunner::new(&bestiary, EncounterSpec::duel("knight", "dummy"), SimConfig::default()).unwrap();
        let report = runner.run(10_000, 2024);

        assert_eq!(report.completed, 10_000);
        assert_eq!(report.wins("knight"), Some(10_000));

        let expected = expected_attacks(10);
        let mean = report.mean_rounds();
        assert!(
            (mean - expected).abs() < 0.05,
            "Mean rounds was {}, expected {}",
            mean,
            expected
        );
    }

    #[test]
    fn test_mirror_match_is_even() {
        let bestiary = duelists();
        let runner =
            TrialRunner::new(&bestiary, EncounterSpec::duel("duelist", "duelist"), SimConfig::default()).unwrap();
        let report = runner.run(10_000, 777);

        let rate = report.win_rate("duelist #1").unwrap();
        assert!(rate > 0.46 && rate < 0.54, "Win rate was {}", rate);
        assert_eq!(report.draws, 0);
        assert_eq!(
            report.wins("duelist #1").unwrap() + report.wins("duelist #2").unwrap(),
            report.completed
        );
    }

    #[test]
    fn test_parallel_runs_are_deterministic() {
        let bestiary = Bestiary::builtin().unwrap();
        let spec = EncounterSpec::new(vec![
            SideSpec::new("goblins", &["goblin", "goblin", "goblin"]),
            SideSpec::new("orcs", &["orc"]),
        ]);
        let runner = TrialRunner::new(&bestiary, spec, SimConfig::default()).unwrap();

        let first = runner.run(200, 99);
        let second = runner.run(200, 99);
        assert_eq!(first.outcomes, second.outcomes);
        assert_eq!(first.sides, second.sides);

        // Each trial equals a standalone run with its own seed
        for index in [0usize, 17, 199] {
            let single = runner.run_trial(99 + index as u64).unwrap();
            assert_eq!(first.outcomes[index], single);
        }
    }

    #[test]
    fn test_sink_sees_outcomes_in_order() {
        let bestiary = Bestiary::builtin().unwrap();
        let runner =
            TrialRunner::new(&bestiary, EncounterSpec::duel("orc", "gnoll"), SimConfig::default()).unwrap();

        let mut sink: Vec<OutcomeRecord> = Vec::new();
        let report = runner.run_with_sink(50, 10, &mut sink);
        assert_eq!(sink.len(), 50);
        assert_eq!(sink, report.outcomes);
        for (index, outcome) in sink.iter().enumerate() {
            assert_eq!(outcome.seed, 10 + index as u64);
        }
    }

    #[test]
    fn test_failed_trials_are_isolated() {
        let catalog = FlakyCatalog::new(Bestiary::builtin().unwrap());
        let spec = EncounterSpec::duel("orc", "goblin");
        let runner = TrialRunner::new(&catalog, spec.clone(), SimConfig::default()).unwrap();
        catalog.failing.store(true, Ordering::SeqCst);

        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let report = pool.install(|| runner.run(50, 5));

        assert!(!report.failures.is_empty());
        assert!(report.completed > 0);
        assert_eq!(report.completed + report.failures.len(), 50);
        assert_eq!(report.cancelled, 0);
        assert_eq!(report.outcomes.len(), report.completed);

        let wins: usize = report.sides.iter().map(|s| s.wins).sum();
        assert_eq!(wins + report.draws, report.completed);

        for failure in &report.failures {
            assert_eq!(failure.seed, 5 + failure.index as u64);
            assert!(failure.message.contains("Unknown creature"), "{}", failure.message);
            assert!(report.outcomes.iter().all(|o| o.seed != failure.seed));
        }

        // Completed trials are untouched by their failing neighbours
        let reliable = Bestiary::builtin().unwrap();
        let clean = TrialRunner::new(&reliable, spec, SimConfig::default()).unwrap();
        for outcome in &report.outcomes {
            assert_eq!(outcome, &clean.run_trial(outcome.seed).unwrap());
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let bestiary = Bestiary::builtin().unwrap();
        let cancel = CancelToken::new();
        let runner = TrialRunner::new(&bestiary, EncounterSpec::duel("orc", "ogre"), SimConfig::default())
            .unwrap()
            .with_cancel_token(cancel.clone());

        cancel.cancel();
        assert!(runner.cancel_token().is_cancelled());

        let report = runner.run(100, 1);
        assert_eq!(report.cancelled, 100);
        assert_eq!(report.completed, 0);
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn test_rejects_bad_setup() {
        let bestiary = Bestiary::builtin().unwrap();
        let unknown = TrialRunner::new(&bestiary, EncounterSpec::duel("orc", "lich"), SimConfig::default());
        assert!(matches!(unknown, Err(SimError::ContentNotFound { .. })));

        let config = SimConfig {
            max_rounds: 0,
            ..SimConfig::default()
        };
        let invalid = TrialRunner::new(&bestiary, EncounterSpec::duel("orc", "ogre"), config);
        assert!(matches!(invalid, Err(SimError::Config(_))));
    }

    #[test]
    fn test_report_serializes() {
        let bestiary = Bestiary::builtin().unwrap();
        let runner =
            TrialRunner::new(&bestiary, EncounterSpec::duel("bandit", "cultist"), SimConfig::default()).unwrap();
        let report = runner.run(20, 3);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["requested"], 20);
        assert_eq!(json["outcomes"].as_array().unwrap().len(), report.completed);
    }
}

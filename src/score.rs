//! Running score and best-score bookkeeping.
//!
//! The displayed score is `survival + bonus`: survival grows by one every active tick, bonus grows
//! when the character picks up a collectible. Neither counter ever decreases inside a session, so
//! the displayed score is monotonic and the best score can be checked after every mutation.

use bevy::prelude::*;

use crate::config::{GameConfig, ScoreConfig};
use crate::state::{session_running, GameSet, GameState};
use crate::store::{KeyValueStore, StoreError};

/// Inserts the score resource (unless a test already provided one) and hooks it into the
/// lifecycle: best score is re-read whenever the menu is shown, counters reset on every new
/// session, and one survival point is added per active tick.
pub struct ScorePlugin;

impl Plugin for ScorePlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<ScoreTracker>() {
            let config = app
                .world()
                .get_resource::<GameConfig>()
                .map(|cfg| cfg.score.clone())
                .unwrap_or_default();
            app.insert_resource(ScoreTracker::new(default_store(), &config));
        }

        app.add_systems(OnEnter(GameState::MainMenu), load_best_score)
            .add_systems(OnEnter(GameState::Playing), reset_score)
            .add_systems(OnEnter(GameState::GameOver), report_final_score)
            .add_systems(
                Update,
                tick_score
                    .in_set(GameSet::Effects)
                    .run_if(in_state(GameState::Playing).and_then(session_running)),
            );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_store() -> Box<dyn KeyValueStore> {
    let store = crate::store::RonFileStore::in_user_data_dir();
    info!("Best score stored at {}", store.path().display());
    Box::new(store)
}

// No filesystem in the browser; the best score lives for the tab's lifetime.
#[cfg(target_arch = "wasm32")]
fn default_store() -> Box<dyn KeyValueStore> {
    Box::new(crate::store::MemoryStore::default())
}

#[derive(Resource)]
pub struct ScoreTracker {
    survival: u64,
    bonus: u64,
    displayed: u64,
    best: u64,
    points_per_unit: u64,
    key: String,
    store: Box<dyn KeyValueStore>,
    write_failed: bool,
}

impl ScoreTracker {
    pub fn new(store: Box<dyn KeyValueStore>, config: &ScoreConfig) -> Self {
        Self {
            survival: 0,
            bonus: 0,
            displayed: 0,
            best: 0,
            points_per_unit: config.points_per_unit,
            key: config.high_score_key.clone(),
            store,
            write_failed: false,
        }
    }

    #[cfg(test)]
    pub fn in_memory(config: &ScoreConfig) -> Self {
        Self::new(Box::new(crate::store::MemoryStore::default()), config)
    }

    pub fn displayed(&self) -> u64 {
        self.displayed
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    pub fn survival(&self) -> u64 {
        self.survival
    }

    pub fn bonus(&self) -> u64 {
        self.bonus
    }

    /// Refreshes the best score from the store, which stays the source of truth. An unreadable
    /// store counts as no record at all: best drops to zero and the error is handed back.
    pub fn load_best(&mut self) -> Result<u64, StoreError> {
        match self.store.get_integer(&self.key) {
            Ok(stored) => {
                self.best = stored.unwrap_or(0).max(0) as u64;
                Ok(self.best)
            }
            Err(e) => {
                self.best = 0;
                Err(e)
            }
        }
    }

    /// One active simulation tick survived.
    pub fn tick(&mut self) {
        self.survival += 1;
        self.recompute();
    }

    pub fn award_bonus(&mut self, units: u64) {
        self.bonus += units * self.points_per_unit;
        self.recompute();
    }

    pub fn reset(&mut self) {
        self.survival = 0;
        self.bonus = 0;
        self.displayed = 0;
    }

    fn recompute(&mut self) {
        self.displayed = self.survival + self.bonus;
        self.check_best();
    }

    /// Writes through immediately on every new record. If the write fails the in-memory best still
    /// moves; the next record attempts the write again.
    fn check_best(&mut self) {
        if self.displayed <= self.best {
            return;
        }

        self.best = self.displayed;
        match self.store.set_integer(&self.key, self.best as i64) {
            Ok(()) => {
                if self.write_failed {
                    info!("Best score store recovered; saved {}", self.best);
                }
                self.write_failed = false;
            }
            Err(e) => {
                if !self.write_failed {
                    warn!("Could not save best score {}: {}", self.best, e);
                }
                self.write_failed = true;
            }
        }
    }
}

pub fn load_best_score(mut score: ResMut<ScoreTracker>) {
    match score.load_best() {
        Ok(best) => debug!("Best score: {}", best),
        Err(e) => warn!("Could not read best score, showing 0: {}", e),
    }
}

fn reset_score(mut score: ResMut<ScoreTracker>) {
    score.reset();
}

fn tick_score(mut score: ResMut<ScoreTracker>) {
    score.tick();
}

fn report_final_score(score: Res<ScoreTracker>) {
    info!(
        "Final score {} ({} survival + {} bonus), best {}",
        score.displayed(),
        score.survival(),
        score.bonus(),
        score.best()
    );
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::store::MemoryStore;

    /// Shared view into a memory store so tests can inspect what was persisted, with a switch to
    /// simulate an unavailable device store.
    #[derive(Clone, Default)]
    struct SharedStore {
        inner: Arc<Mutex<MemoryStore>>,
        fail_reads: Arc<Mutex<bool>>,
        fail_writes: Arc<Mutex<bool>>,
    }

    impl SharedStore {
        fn persisted(&self) -> Option<i64> {
            self.inner.lock().unwrap().get_integer("HighScore").unwrap()
        }
    }

    impl KeyValueStore for SharedStore {
        fn get_integer(&self, key: &str) -> Result<Option<i64>, StoreError> {
            if *self.fail_reads.lock().unwrap() {
                return Err(StoreError::Unavailable("reads disabled".into()));
            }
            self.inner.lock().unwrap().get_integer(key)
        }

        fn set_integer(&mut self, key: &str, value: i64) -> Result<(), StoreError> {
            if *self.fail_writes.lock().unwrap() {
                return Err(StoreError::Unavailable("writes disabled".into()));
            }
            self.inner.lock().unwrap().set_integer(key, value)
        }
    }

    fn tracker(store: &SharedStore) -> ScoreTracker {
        ScoreTracker::new(Box::new(store.clone()), &ScoreConfig::default())
    }

    #[test]
    fn ticks_and_pickup_add_up() {
        let store = SharedStore::default();
        let mut score = tracker(&store);

        for _ in 0..5 {
            score.tick();
        }
        assert_eq!(score.displayed(), 5);

        score.award_bonus(10);
        assert_eq!(score.displayed(), 1005);
        assert_eq!(score.bonus(), 1000);
        assert_eq!(store.persisted(), Some(1005));
    }

    #[test]
    fn reset_zeroes_everything_but_best() {
        let store = SharedStore::default();
        let mut score = tracker(&store);
        score.award_bonus(3);
        score.tick();

        score.reset();
        assert_eq!(score.displayed(), 0);
        assert_eq!(score.survival(), 0);
        assert_eq!(score.bonus(), 0);
        assert_eq!(score.best(), 301);
    }

    #[test]
    fn best_tracks_maximum_across_sessions() {
        let store = SharedStore::default();
        let mut score = tracker(&store);

        let mut observed_max = 0;
        for session in [vec![1, 0, 2], vec![0], vec![3, 3]] {
            score.reset();
            for units in session {
                score.tick();
                score.award_bonus(units);
                observed_max = observed_max.max(score.displayed());
            }
        }

        assert_eq!(score.best(), observed_max);
        assert_eq!(store.persisted(), Some(observed_max as i64));
    }

    #[test]
    fn lower_scores_do_not_overwrite_record() {
        let store = SharedStore::default();
        store.inner.lock().unwrap().set_integer("HighScore", 5000).unwrap();

        let mut score = tracker(&store);
        assert_eq!(score.load_best().unwrap(), 5000);
        score.award_bonus(10);
        assert_eq!(store.persisted(), Some(5000));
    }

    #[test]
    fn read_failure_defaults_to_zero() {
        let store = SharedStore::default();
        *store.fail_reads.lock().unwrap() = true;

        let mut score = tracker(&store);
        assert!(score.load_best().is_err());
        assert_eq!(score.best(), 0);
    }

    #[test]
    fn read_failure_after_a_record_also_yields_zero() {
        let store = SharedStore::default();
        store.inner.lock().unwrap().set_integer("HighScore", 5000).unwrap();

        let mut score = tracker(&store);
        assert_eq!(score.load_best().unwrap(), 5000);

        *store.fail_reads.lock().unwrap() = true;
        assert!(score.load_best().is_err());
        assert_eq!(score.best(), 0);

        *store.fail_reads.lock().unwrap() = false;
        assert_eq!(score.load_best().unwrap(), 5000);
    }

    #[test]
    fn failed_write_is_retried_on_next_record() {
        let store = SharedStore::default();
        let mut score = tracker(&store);

        *store.fail_writes.lock().unwrap() = true;
        score.tick();
        assert_eq!(score.displayed(), 1);
        assert_eq!(score.best(), 1);
        assert_eq!(store.persisted(), None);

        *store.fail_writes.lock().unwrap() = false;
        score.tick();
        assert_eq!(store.persisted(), Some(2));
    }

    #[test]
    fn displayed_score_never_decreases_while_playing() {
        let store = SharedStore::default();
        let mut score = tracker(&store);
        let mut last = score.displayed();
        for i in 0..200 {
            if i % 17 == 0 {
                score.award_bonus(10);
            } else {
                score.tick();
            }
            assert!(score.displayed() >= last);
            last = score.displayed();
        }
    }
}

use crate::math::GeoHelper;
use crate::processing::store::{CanonicalStore, EntityRecord};
use crate::wire::WireRecord;

/// Outcome of comparing a fix against the entity's canonical position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// First sighting or real movement; the new position was stored.
    Accepted,
    /// Movement below threshold; the previous position was kept.
    Suppressed,
}

/// Suppresses GPS jitter around a stationary point.
#[derive(Debug, Clone)]
pub struct DenoiseEngine {
    threshold: f64,
}

impl DenoiseEngine {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn decide(&self, previous: Option<&EntityRecord>, fix: &WireRecord) -> Decision {
        match previous {
            None => Decision::Accepted,
            Some(old) => {
                let delta = GeoHelper::manhattan(fix.lat, fix.lng, old.lat, old.lng);
                if delta < self.threshold {
                    Decision::Suppressed
                } else {
                    Decision::Accepted
                }
            }
        }
    }

    /// Folds `fix` into the store. Status and timestamp always come from the fix,
    /// even when the position is suppressed.
    pub fn apply<'s>(
        &self,
        store: &'s mut CanonicalStore,
        fix: &WireRecord,
        now_ms: u64,
    ) -> (Decision, &'s EntityRecord) {
        let previous = store.get(fix.id);
        let decision = self.decide(previous, fix);
        let (lat, lng) = match (decision, previous) {
            (Decision::Suppressed, Some(old)) => (old.lat, old.lng),
            _ => (fix.lat, fix.lng),
        };

        let record = EntityRecord {
            id: fix.id,
            lat,
            lng,
            status: fix.status,
            last_update: now_ms,
            is_moving: decision == Decision::Accepted,
        };
        (decision, store.upsert(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::MOVE_THRESHOLD;

    #[test]
    fn first_sighting_is_stored_exactly() {
        let engine = DenoiseEngine::new(MOVE_THRESHOLD);
        let mut store = CanonicalStore::new();
        let fix = WireRecord::new(1, 37.5, -122.0, 1);

        let (decision, stored) = engine.apply(&mut store, &fix, 100);
        assert_eq!(decision, Decision::Accepted);
        assert_eq!(
            stored,
            &EntityRecord {
                id: 1,
                lat: 37.5,
                lng: -122.0,
                status: 1,
                last_update: 100,
                is_moving: true,
            }
        );
    }

    #[test]
    fn jitter_below_threshold_keeps_old_position() {
        let engine = DenoiseEngine::new(MOVE_THRESHOLD);
        let mut store = CanonicalStore::new();
        engine.apply(&mut store, &WireRecord::new(1, 37.5, -122.0, 1), 100);

        let (decision, stored) =
            engine.apply(&mut store, &WireRecord::new(1, 37.500001, -122.0, 4), 200);
        assert_eq!(decision, Decision::Suppressed);
        assert_eq!((stored.lat, stored.lng), (37.5, -122.0));
        assert!(!stored.is_moving);
        assert_eq!(stored.status, 4);
        assert_eq!(stored.last_update, 200);
    }

    #[test]
    fn movement_at_or_above_threshold_is_accepted() {
        let engine = DenoiseEngine::new(0.5);
        let mut store = CanonicalStore::new();
        engine.apply(&mut store, &WireRecord::new(9, 10.0, 10.0, 0), 1);

        let (decision, stored) =
            engine.apply(&mut store, &WireRecord::new(9, 10.25, 10.25, 0), 2);
        assert_eq!(decision, Decision::Accepted);
        assert_eq!((stored.lat, stored.lng), (10.25, 10.25));
        assert!(stored.is_moving);
    }

    #[test]
    fn suppressed_fixes_do_not_drift_the_anchor() {
        let engine = DenoiseEngine::new(MOVE_THRESHOLD);
        let mut store = CanonicalStore::new();
        engine.apply(&mut store, &WireRecord::new(2, 0.0, 0.0, 0), 0);
        for step in 1..=10 {
            let lat = step as f64 * 0.000_01;
            engine.apply(&mut store, &WireRecord::new(2, lat.min(0.000_04), 0.0, 0), step);
        }
        assert_eq!(store.get(2).unwrap().lat, 0.0);
        assert_eq!(store.get(2).unwrap().last_update, 10);
    }
}

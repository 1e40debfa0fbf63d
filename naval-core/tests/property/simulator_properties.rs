use chrono::NaiveTime;
use naval_core::{DashboardState, DriftSimulator, MAX_DRIFT_SCORE, MIN_ACCURACY};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn clock() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap()
}

proptest! {
    #[test]
    fn drift_score_stays_in_range(seed in any::<u64>(), start in 0.0f64..=100.0, ticks in 0usize..300) {
        let sim = DriftSimulator::default();
        let mut state = DashboardState::default();
        state.metrics.drift_score = start;
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..ticks {
            state.tick(&sim, &mut rng, clock());
            prop_assert!(state.metrics.drift_score >= 0.0);
            prop_assert!(state.metrics.drift_score <= MAX_DRIFT_SCORE);
        }
    }

    #[test]
    fn accuracy_never_below_floor(seed in any::<u64>(), start in 70.0f64..=100.0, ticks in 0usize..300) {
        let sim = DriftSimulator::default();
        let mut state = DashboardState::default();
        state.metrics.accuracy = start;
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..ticks {
            state.tick(&sim, &mut rng, clock());
            prop_assert!(state.metrics.accuracy >= MIN_ACCURACY);
        }
    }

    #[test]
    fn ship_confidence_stays_in_range(seed in any::<u64>(), ticks in 0usize..300, retrain_every in 1usize..50) {
        let sim = DriftSimulator::default();
        let mut state = DashboardState::default();
        let mut rng = StdRng::seed_from_u64(seed);

        for i in 0..ticks {
            state.tick(&sim, &mut rng, clock());
            if i % retrain_every == 0 {
                state.retrain(clock());
            }
            for ship in &state.ships {
                prop_assert!(ship.confidence >= 60.0);
                prop_assert!(ship.confidence <= 100.0);
            }
        }
    }

    #[test]
    fn alert_only_raised_on_upward_crossing(seed in any::<u64>(), start in 0.0f64..=40.0, ticks in 1usize..100) {
        let sim = DriftSimulator::default();
        let mut state = DashboardState::default();
        state.metrics.drift_score = start;
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..ticks {
            let was_active = state.alert_active();
            let outcome = state.tick(&sim, &mut rng, clock());
            if outcome.alert_raised {
                prop_assert!(!was_active);
                prop_assert!(outcome.previous_drift <= 25.0);
                prop_assert!(outcome.drift_score > 25.0);
            } else {
                prop_assert_eq!(state.alert_active(), was_active);
            }
        }
    }

    #[test]
    fn retrain_restores_baseline(seed in any::<u64>(), ticks in 0usize..200, alert in any::<bool>()) {
        let sim = DriftSimulator::default();
        let mut state = DashboardState::default();
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..ticks {
            state.tick(&sim, &mut rng, clock());
        }
        if alert && !state.alert_active() {
            state.toggle_alert();
        }

        state.retrain(clock());

        prop_assert_eq!(state.metrics.drift_score, 5.0);
        prop_assert_eq!(state.metrics.accuracy, 98.0);
        prop_assert!(!state.alert_active());
    }
}

//! Discovery pipeline property-based and unit tests
//!
//! Covers:
//! - Haversine distance behaviour
//! - Ranking order (priority first, distance second, stable otherwise)
//! - Geo radius filtering
//! - Priority index bumps driven by contact cooldown

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use shared::geo::{distance_within, haversine_km};
use shared::ranking::{
    next_priority_index, rank_candidates, should_bump_priority, RankCandidate,
    DEFAULT_CONTACT_COOLDOWN_SECS,
};
use shared::GeoPoint;
use uuid::Uuid;

const RADIUS_KM: f64 = 1000.0;

// ============================================================================
// Property Test Strategies
// ============================================================================

fn latitude_strategy() -> impl Strategy<Value = f64> {
    -90.0..=90.0f64
}

fn longitude_strategy() -> impl Strategy<Value = f64> {
    -180.0..=180.0f64
}

fn point_strategy() -> impl Strategy<Value = GeoPoint> {
    (latitude_strategy(), longitude_strategy()).prop_map(|(lat, lng)| GeoPoint::new(lat, lng))
}

/// Candidates near Sydney so most of them survive the radius filter
fn located_candidates_strategy() -> impl Strategy<Value = Vec<RankCandidate>> {
    prop::collection::vec((0..5i32, -35.0..-32.0f64, 150.0..152.0f64), 0..30).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (priority_index, lat, lng))| RankCandidate {
                id: Uuid::from_u128(i as u128 + 1),
                priority_index,
                location: Some(GeoPoint::new(lat, lng)),
            })
            .collect()
    })
}

fn unlocated_candidates_strategy() -> impl Strategy<Value = Vec<RankCandidate>> {
    prop::collection::vec(0..5i32, 0..30).prop_map(|priorities| {
        priorities
            .into_iter()
            .enumerate()
            .map(|(i, priority_index)| RankCandidate {
                id: Uuid::from_u128(i as u128 + 1),
                priority_index,
                location: None,
            })
            .collect()
    })
}

fn sydney() -> GeoPoint {
    GeoPoint::new(-33.8688, 151.2093)
}

// ============================================================================
// Distance
// ============================================================================

proptest! {
    #[test]
    fn distance_is_symmetric(a in point_strategy(), b in point_strategy()) {
        let ab = haversine_km(a, b);
        let ba = haversine_km(b, a);
        prop_assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn distance_to_self_is_zero(a in point_strategy()) {
        prop_assert!(haversine_km(a, a).abs() < 1e-6);
    }

    #[test]
    fn distance_is_bounded_by_half_circumference(a in point_strategy(), b in point_strategy()) {
        let d = haversine_km(a, b);
        prop_assert!(d.is_finite());
        prop_assert!(d >= 0.0);
        // pi * 6371 km, with a little slack for rounding
        prop_assert!(d <= 20_016.0);
    }

    #[test]
    fn distance_within_agrees_with_haversine(a in point_strategy(), b in point_strategy()) {
        let d = haversine_km(a, b);
        match distance_within(a, b, RADIUS_KM) {
            Some(within) => prop_assert!(within <= RADIUS_KM && (within - d).abs() < 1e-9),
            None => prop_assert!(d > RADIUS_KM),
        }
    }
}

// ============================================================================
// Ranking
// ============================================================================

proptest! {
    #[test]
    fn ranking_without_origin_keeps_every_candidate(candidates in unlocated_candidates_strategy()) {
        let ranked = rank_candidates(candidates.clone(), None, RADIUS_KM);
        prop_assert_eq!(ranked.len(), candidates.len());
        prop_assert!(ranked.iter().all(|r| r.distance_km.is_none()));
    }

    #[test]
    fn ranking_orders_by_priority_then_input_order(candidates in unlocated_candidates_strategy()) {
        let ranked = rank_candidates(candidates, None, RADIUS_KM);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].priority_index <= pair[1].priority_index);
            if pair[0].priority_index == pair[1].priority_index {
                // ids were assigned in insertion order
                prop_assert!(pair[0].id < pair[1].id);
            }
        }
    }

    #[test]
    fn geo_ranking_orders_by_priority_then_distance(candidates in located_candidates_strategy()) {
        let ranked = rank_candidates(candidates, Some(sydney()), RADIUS_KM);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].priority_index <= pair[1].priority_index);
            if pair[0].priority_index == pair[1].priority_index {
                prop_assert!(pair[0].distance_km <= pair[1].distance_km);
            }
        }
    }

    #[test]
    fn geo_ranking_never_returns_far_candidates(
        candidates in located_candidates_strategy(),
        radius in 1.0..500.0f64,
    ) {
        let ranked = rank_candidates(candidates.clone(), Some(sydney()), radius);
        prop_assert!(ranked.len() <= candidates.len());
        for r in &ranked {
            let distance = r.distance_km.unwrap_or(f64::INFINITY);
            prop_assert!(distance <= radius);
        }
    }

    #[test]
    fn ranking_is_a_permutation_of_survivors(candidates in unlocated_candidates_strategy()) {
        let mut input: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
        let mut output: Vec<Uuid> = rank_candidates(candidates, None, RADIUS_KM)
            .into_iter()
            .map(|r| r.id)
            .collect();
        input.sort();
        output.sort();
        prop_assert_eq!(input, output);
    }
}

#[test]
fn geo_ranking_drops_businesses_without_coordinates() {
    let candidates = vec![
        RankCandidate {
            id: Uuid::from_u128(1),
            priority_index: 0,
            location: None,
        },
        RankCandidate {
            id: Uuid::from_u128(2),
            priority_index: 0,
            location: Some(GeoPoint::new(-33.87, 151.21)),
        },
    ];

    let ranked = rank_candidates(candidates, Some(sydney()), RADIUS_KM);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].id, Uuid::from_u128(2));
}

#[test]
fn lower_priority_index_wins_over_proximity() {
    let near_busy = RankCandidate {
        id: Uuid::from_u128(1),
        priority_index: 3,
        location: Some(GeoPoint::new(-33.87, 151.21)),
    };
    let far_idle = RankCandidate {
        id: Uuid::from_u128(2),
        priority_index: 0,
        location: Some(GeoPoint::new(-37.81, 144.96)),
    };

    let ranked = rank_candidates(vec![near_busy, far_idle], Some(sydney()), RADIUS_KM);
    assert_eq!(ranked[0].id, Uuid::from_u128(2));
    assert_eq!(ranked[1].id, Uuid::from_u128(1));
}

// ============================================================================
// Priority bumps
// ============================================================================

fn cooldown() -> Duration {
    Duration::seconds(DEFAULT_CONTACT_COOLDOWN_SECS)
}

proptest! {
    #[test]
    fn priority_index_never_decreases(
        start in 0..1000i32,
        gaps in prop::collection::vec(prop::option::of(0..7200i64), 0..40),
    ) {
        let mut now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let mut last_contact = None;
        let mut priority = start;

        for gap in gaps {
            // None models a contact from a different visitor pair
            let previous = match gap {
                Some(secs) => {
                    now = now + Duration::seconds(secs);
                    last_contact
                }
                None => None,
            };
            let bump = should_bump_priority(previous, now, cooldown());
            let next = next_priority_index(priority, bump);
            prop_assert!(next >= priority);
            prop_assert!(next - priority <= 1);
            priority = next;
            last_contact = Some(now);
        }
    }

    #[test]
    fn contact_inside_cooldown_never_bumps(elapsed in 0..DEFAULT_CONTACT_COOLDOWN_SECS) {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let last = now - Duration::seconds(elapsed);
        prop_assert!(!should_bump_priority(Some(last), now, cooldown()));
    }

    #[test]
    fn contact_after_cooldown_always_bumps(extra in 1..86_400i64) {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let last = now - cooldown() - Duration::seconds(extra);
        prop_assert!(should_bump_priority(Some(last), now, cooldown()));
    }
}

#[test]
fn first_contact_moves_business_behind_idle_one() {
    let x = Uuid::from_u128(1);
    let y = Uuid::from_u128(2);
    let mut businesses = vec![
        RankCandidate {
            id: x,
            priority_index: 0,
            location: None,
        },
        RankCandidate {
            id: y,
            priority_index: 0,
            location: None,
        },
    ];

    let before: Vec<Uuid> = rank_candidates(businesses.clone(), None, RADIUS_KM)
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(before, vec![x, y]);

    // First-ever communication for X
    let bump = should_bump_priority(None, Utc::now(), cooldown());
    businesses[0].priority_index = next_priority_index(businesses[0].priority_index, bump);
    assert_eq!(businesses[0].priority_index, 1);

    let after: Vec<Uuid> = rank_candidates(businesses, None, RADIUS_KM)
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(after, vec![y, x]);
}

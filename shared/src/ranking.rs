//! Discovery ranking
//!
//! Businesses are shown in ascending `priority_index` order. The index is
//! bumped whenever a visitor makes contact outside the cooldown window, so
//! frequently contacted businesses drift down the list and idle ones get
//! exposure. When the caller supplies a location, distance is the secondary
//! key and anything outside the search radius is dropped.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::geo;
use crate::types::GeoPoint;

/// Default time a visitor must wait before contacting the same business bumps it again
pub const DEFAULT_CONTACT_COOLDOWN_SECS: i64 = 60 * 60;

/// The slice of a business the ranking stage needs
#[derive(Debug, Clone, PartialEq)]
pub struct RankCandidate {
    pub id: Uuid,
    pub priority_index: i32,
    pub location: Option<GeoPoint>,
}

/// A candidate that survived the geo stage, in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedBusiness {
    pub id: Uuid,
    pub priority_index: i32,
    pub distance_km: Option<f64>,
}

/// Apply the geo stage (when `origin` is set) and order the survivors
///
/// The sort is stable: candidates with equal keys keep their input order.
pub fn rank_candidates(
    candidates: Vec<RankCandidate>,
    origin: Option<GeoPoint>,
    max_radius_km: f64,
) -> Vec<RankedBusiness> {
    match origin {
        Some(origin) => {
            let mut ranked: Vec<RankedBusiness> = candidates
                .into_iter()
                .filter_map(|c| {
                    let location = c.location?;
                    let distance = geo::distance_within(origin, location, max_radius_km)?;
                    Some(RankedBusiness {
                        id: c.id,
                        priority_index: c.priority_index,
                        distance_km: Some(distance),
                    })
                })
                .collect();

            ranked.sort_by(|a, b| {
                a.priority_index.cmp(&b.priority_index).then_with(|| {
                    let da = a.distance_km.unwrap_or(f64::INFINITY);
                    let db = b.distance_km.unwrap_or(f64::INFINITY);
                    da.total_cmp(&db)
                })
            });
            ranked
        }
        None => {
            let mut ranked: Vec<RankedBusiness> = candidates
                .into_iter()
                .map(|c| RankedBusiness {
                    id: c.id,
                    priority_index: c.priority_index,
                    distance_km: None,
                })
                .collect();

            ranked.sort_by_key(|r| r.priority_index);
            ranked
        }
    }
}

/// Decide whether a new contact should bump the business's priority index
///
/// `last_contact` is the newest earlier communication from the same
/// visitor/business pair.
pub fn should_bump_priority(
    last_contact: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> bool {
    match last_contact {
        None => true,
        Some(at) => at < now - cooldown,
    }
}

/// Priority index after a contact; never lower than `current`
pub fn next_priority_index(current: i32, bump: bool) -> i32 {
    if bump {
        current.saturating_add(1)
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(n: u128, priority_index: i32, location: Option<GeoPoint>) -> RankCandidate {
        RankCandidate {
            id: Uuid::from_u128(n),
            priority_index,
            location,
        }
    }

    fn ids(ranked: &[RankedBusiness]) -> Vec<u128> {
        ranked.iter().map(|r| r.id.as_u128()).collect()
    }

    #[test]
    fn test_orders_by_priority_ascending() {
        let ranked = rank_candidates(
            vec![candidate(1, 3, None), candidate(2, 0, None), candidate(3, 1, None)],
            None,
            1000.0,
        );
        assert_eq!(ids(&ranked), vec![2, 3, 1]);
        assert!(ranked.iter().all(|r| r.distance_km.is_none()));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranked = rank_candidates(
            vec![candidate(7, 0, None), candidate(3, 0, None), candidate(5, 0, None)],
            None,
            1000.0,
        );
        assert_eq!(ids(&ranked), vec![7, 3, 5]);
    }

    #[test]
    fn test_geo_drops_far_and_unlocated_candidates() {
        let origin = GeoPoint::new(-33.8688, 151.2093);
        let near = GeoPoint::new(-33.80, 151.20);
        let far = GeoPoint::new(51.5074, -0.1278);

        let ranked = rank_candidates(
            vec![candidate(1, 0, Some(far)), candidate(2, 0, None), candidate(3, 0, Some(near))],
            Some(origin),
            1000.0,
        );
        assert_eq!(ids(&ranked), vec![3]);
        assert!(ranked[0].distance_km.unwrap() < 10.0);
    }

    #[test]
    fn test_distance_breaks_priority_ties() {
        let origin = GeoPoint::new(0.0, 0.0);
        let ranked = rank_candidates(
            vec![
                candidate(1, 1, Some(GeoPoint::new(0.0, 2.0))),
                candidate(2, 1, Some(GeoPoint::new(0.0, 1.0))),
                candidate(3, 0, Some(GeoPoint::new(0.0, 3.0))),
            ],
            Some(origin),
            1000.0,
        );
        assert_eq!(ids(&ranked), vec![3, 2, 1]);
    }

    #[test]
    fn test_priority_beats_distance() {
        let origin = GeoPoint::new(0.0, 0.0);
        let ranked = rank_candidates(
            vec![
                candidate(1, 2, Some(GeoPoint::new(0.0, 0.1))),
                candidate(2, 1, Some(GeoPoint::new(0.0, 5.0))),
            ],
            Some(origin),
            1000.0,
        );
        assert_eq!(ids(&ranked), vec![2, 1]);
    }

    #[test]
    fn test_first_contact_bumps() {
        assert!(should_bump_priority(None, Utc::now(), Duration::hours(1)));
    }

    #[test]
    fn test_contact_inside_cooldown_does_not_bump() {
        let now = Utc::now();
        let recent = now - Duration::minutes(10);
        assert!(!should_bump_priority(Some(recent), now, Duration::hours(1)));
    }

    #[test]
    fn test_contact_after_cooldown_bumps() {
        let now = Utc::now();
        let old = now - Duration::minutes(61);
        assert!(should_bump_priority(Some(old), now, Duration::hours(1)));
    }

    #[test]
    fn test_next_priority_saturates() {
        assert_eq!(next_priority_index(0, true), 1);
        assert_eq!(next_priority_index(4, false), 4);
        assert_eq!(next_priority_index(i32::MAX, true), i32::MAX);
    }
}

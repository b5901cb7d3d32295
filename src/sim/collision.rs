//! Swept-segment vs circle collision detection
//!
//! The slash input arrives as a pair of cursor positions (previous and
//! current). A cut happens when the segment between them crosses an entity's
//! circular hitbox, so fast sweeps cannot tunnel through a fruit between
//! frames.

use glam::Vec2;

use super::state::Entity;

/// Squared length below which a swept segment is treated as a single point
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Check whether the segment `p1 -> p2` crosses the circle at `center`.
///
/// Solves the quadratic for the boundary crossing; a root t in [0, 1] is a
/// hit. A zero-length segment degrades to a point-in-circle test, and a
/// segment fully enclosed by the circle (t1 < 0 and t2 > 1) also counts.
pub fn segment_circle_hit(p1: Vec2, p2: Vec2, center: Vec2, radius: f32) -> bool {
    let d = p2 - p1;
    let f = p1 - center;

    let a = d.length_squared();
    if a < DEGENERATE_EPSILON {
        return f.length_squared() <= radius * radius;
    }

    let b = 2.0 * f.dot(d);
    let c = f.length_squared() - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return false;
    }
    let discriminant = discriminant.sqrt();

    let t1 = (-b - discriminant) / (2.0 * a);
    let t2 = (-b + discriminant) / (2.0 * a);

    if (0.0..=1.0).contains(&t1) || (0.0..=1.0).contains(&t2) {
        return true;
    }

    // Segment entirely inside the circle
    t1 < 0.0 && t2 > 1.0
}

/// Collect the ids of active entities (not sliced, not missed) whose hitboxes
/// the segment crosses, in the population's insertion order.
///
/// The population stays small (a handful of fruit on screen), so a linear
/// scan beats any spatial structure.
pub fn sweep_hits(p1: Vec2, p2: Vec2, entities: &[Entity]) -> Vec<u32> {
    entities
        .iter()
        .filter(|e| !e.sliced && !e.missed)
        .filter(|e| segment_circle_hit(p1, p2, e.pos, e.radius))
        .map(|e| e.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Entity, EntityKind, FruitKind};
    use proptest::prelude::*;

    fn fruit_at(id: u32, pos: Vec2) -> Entity {
        Entity::new(id, EntityKind::Fruit(FruitKind::Orange), pos, Vec2::ZERO, 0.0)
    }

    #[test]
    fn segment_through_circle_hits() {
        assert!(segment_circle_hit(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, 0.0),
            1.0,
        ));
    }

    #[test]
    fn segment_far_from_circle_misses() {
        assert!(!segment_circle_hit(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, 100.0),
            1.0,
        ));
    }

    #[test]
    fn zero_length_segment_is_point_test() {
        let p = Vec2::new(3.0, 4.0);
        // Center 0.5 away, radius 1: inside
        assert!(segment_circle_hit(p, p, Vec2::new(3.0, 4.5), 1.0));
        // Center 2 away, radius 1: outside
        assert!(!segment_circle_hit(p, p, Vec2::new(3.0, 6.0), 1.0));
        // Exactly on the boundary counts
        assert!(segment_circle_hit(p, p, Vec2::new(3.0, 5.0), 1.0));
    }

    #[test]
    fn enclosed_segment_hits() {
        // Both endpoints inside a large circle: no boundary crossing in [0,1]
        assert!(segment_circle_hit(
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
            10.0,
        ));
    }

    #[test]
    fn segment_stopping_short_misses() {
        // Segment points at the circle but ends before reaching it
        assert!(!segment_circle_hit(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(10.0, 0.0),
            1.0,
        ));
    }

    #[test]
    fn sweep_skips_sliced_and_missed() {
        let mut a = fruit_at(1, Vec2::new(5.0, 0.0));
        a.sliced = true;
        let mut b = fruit_at(2, Vec2::new(5.0, 0.0));
        b.missed = true;
        let c = fruit_at(3, Vec2::new(5.0, 0.0));

        let hits = sweep_hits(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), &[a, b, c]);
        assert_eq!(hits, vec![3]);
    }

    #[test]
    fn sweep_preserves_population_order() {
        let entities = vec![
            fruit_at(7, Vec2::new(2.0, 0.0)),
            fruit_at(3, Vec2::new(5.0, 0.0)),
            fruit_at(9, Vec2::new(8.0, 0.0)),
        ];
        let hits = sweep_hits(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), &entities);
        assert_eq!(hits, vec![7, 3, 9]);
    }

    /// Closest-point distance from a segment to a point, used as an oracle
    fn segment_distance(p1: Vec2, p2: Vec2, center: Vec2) -> f32 {
        let d = p2 - p1;
        let len_sq = d.length_squared();
        if len_sq < DEGENERATE_EPSILON {
            return p1.distance(center);
        }
        let t = ((center - p1).dot(d) / len_sq).clamp(0.0, 1.0);
        (p1 + d * t).distance(center)
    }

    proptest! {
        #[test]
        fn zero_length_matches_point_containment(
            px in -100.0f32..100.0, py in -100.0f32..100.0,
            cx in -100.0f32..100.0, cy in -100.0f32..100.0,
            r in 0.5f32..50.0,
        ) {
            let p = Vec2::new(px, py);
            let center = Vec2::new(cx, cy);
            prop_assert_eq!(
                segment_circle_hit(p, p, center, r),
                p.distance_squared(center) <= r * r,
            );
        }

        #[test]
        fn segment_through_center_always_hits(
            p1x in -100.0f32..100.0, p1y in -100.0f32..100.0,
            p2x in -100.0f32..100.0, p2y in -100.0f32..100.0,
            r in 0.5f32..30.0,
        ) {
            let p1 = Vec2::new(p1x, p1y);
            let p2 = Vec2::new(p2x, p2y);
            prop_assume!(p1.distance_squared(p2) >= DEGENERATE_EPSILON);
            // A circle centered on the segment midpoint must always be cut
            prop_assert!(segment_circle_hit(p1, p2, (p1 + p2) * 0.5, r));
        }

        #[test]
        fn matches_closest_point_oracle(
            p1x in -100.0f32..100.0, p1y in -100.0f32..100.0,
            p2x in -100.0f32..100.0, p2y in -100.0f32..100.0,
            cx in -100.0f32..100.0, cy in -100.0f32..100.0,
            r in 0.5f32..30.0,
        ) {
            let p1 = Vec2::new(p1x, p1y);
            let p2 = Vec2::new(p2x, p2y);
            let center = Vec2::new(cx, cy);
            let dist = segment_distance(p1, p2, center);
            // Stay away from the boundary where float rounding decides
            prop_assume!((dist - r).abs() > 1e-2);
            prop_assert_eq!(segment_circle_hit(p1, p2, center, r), dist <= r);
        }
    }
}

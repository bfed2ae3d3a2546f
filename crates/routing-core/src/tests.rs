//! Unit tests for routing-core.

#[cfg(test)]
mod ids {
    use crate::{EdgeId, NodeId};

    #[test]
    fn invalid_sentinel_round_trips() {
        assert_eq!(NodeId::default(), NodeId::INVALID);
        assert!(!NodeId::INVALID.is_valid());
        assert!(NodeId(0).is_valid());
    }

    #[test]
    fn index_matches_inner_value() {
        let e = EdgeId(42);
        assert_eq!(e.index(), 42usize);
    }

    #[test]
    fn try_from_usize_rejects_overflow() {
        let huge = u32::MAX as usize + 1;
        assert!(NodeId::try_from(huge).is_err());
    }
}

#[cfg(test)]
mod geo {
    use crate::FixedPoint;

    #[test]
    fn distance_between_identical_points_is_zero() {
        let p = FixedPoint::from_degrees(30.69, -88.04);
        assert!(p.distance_m(p) < 1e-6);
    }

    #[test]
    fn one_degree_latitude_is_roughly_111km() {
        let a = FixedPoint::from_degrees(0.0, 0.0);
        let b = FixedPoint::from_degrees(1.0, 0.0);
        let d = a.distance_m(b);
        assert!((d - 111_195.0).abs() < 1_000.0, "got {d}");
    }

    #[test]
    fn bearing_due_north_is_zero() {
        let a = FixedPoint::from_degrees(0.0, 0.0);
        let b = FixedPoint::from_degrees(1.0, 0.0);
        let bearing = a.bearing_to(b);
        assert!(bearing.abs() < 1e-6 || (bearing - 360.0).abs() < 1e-6);
    }

    #[test]
    fn bearing_due_east_is_ninety() {
        let a = FixedPoint::from_degrees(0.0, 0.0);
        let b = FixedPoint::from_degrees(0.0, 1.0);
        let bearing = a.bearing_to(b);
        assert!((bearing - 90.0).abs() < 0.5, "got {bearing}");
    }

    #[test]
    fn mercator_round_trip_preserves_ordering() {
        let a = FixedPoint::from_degrees(10.0, 10.0).to_mercator();
        let b = FixedPoint::from_degrees(20.0, 10.0).to_mercator();
        assert!(b.y > a.y);
    }

    #[test]
    fn rect_min_squared_distance_is_zero_when_inside() {
        use crate::geo::{MercatorPoint, MercatorRect};
        let rect = MercatorRect { min_x: 0.0, min_y: 0.0, max_x: 10.0, max_y: 10.0 };
        let inside = MercatorPoint { x: 5.0, y: 5.0 };
        assert_eq!(rect.min_squared_distance(inside), 0.0);
    }

    #[test]
    fn rect_min_squared_distance_to_corner() {
        use crate::geo::{MercatorPoint, MercatorRect};
        let rect = MercatorRect { min_x: 0.0, min_y: 0.0, max_x: 10.0, max_y: 10.0 };
        let p = MercatorPoint { x: 13.0, y: 14.0 };
        assert_eq!(rect.min_squared_distance(p), 9.0 + 16.0);
    }
}

#[cfg(test)]
mod config {
    use crate::BuildConfig;

    #[test]
    fn defaults_match_spec() {
        let cfg = BuildConfig::default();
        assert_eq!(cfg.tiny_component_threshold, 1_000);
        assert_eq!(cfg.representative_coordinate_distance_m, 10.0);
        assert!(!cfg.allow_uturns_everywhere);
    }
}

#[cfg(test)]
mod observer {
    use crate::{BuildObserver, NoopObserver, SkipReason};

    struct Counter {
        rejected: usize,
    }

    impl BuildObserver for Counter {
        fn on_turn_rejected(&mut self, _reason: SkipReason) {
            self.rejected += 1;
        }
    }

    #[test]
    fn noop_observer_accepts_all_callbacks() {
        let mut obs = NoopObserver;
        obs.on_turn_rejected(SkipReason::UTurn);
        obs.on_compression_progress(1, 10);
        obs.on_build_complete(5, 2);
    }

    #[test]
    fn custom_observer_counts_rejections() {
        let mut obs = Counter { rejected: 0 };
        obs.on_turn_rejected(SkipReason::Restricted);
        obs.on_turn_rejected(SkipReason::Barrier);
        assert_eq!(obs.rejected, 2);
    }
}

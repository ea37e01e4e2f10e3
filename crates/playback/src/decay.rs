use foundation::time::MS_PER_HOUR;

/// Piecewise-linear age-to-weight curve used to fade events as they age
/// relative to the virtual clock.
///
/// Control points are `(age_ms, weight)` pairs with non-increasing weights.
/// Ages before the first point or past the last are clamped to the endpoint
/// weights; events "in the future" of the clock count as age zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayCurve {
    points: Vec<(f64, f64)>,
}

impl DecayCurve {
    pub fn new(mut points: Vec<(f64, f64)>) -> Self {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { points }
    }

    /// The feed default: full weight when fresh, 0.4 after six hours,
    /// 0.12 after a day.
    pub fn default_fade() -> Self {
        Self::new(vec![
            (0.0, 1.0),
            (6.0 * MS_PER_HOUR, 0.4),
            (24.0 * MS_PER_HOUR, 0.12),
        ])
    }

    pub fn weight(&self, event_time_ms: i64, clock_ms: i64) -> f64 {
        self.weight_at_age((clock_ms - event_time_ms) as f64)
    }

    pub fn weight_at_age(&self, age_ms: f64) -> f64 {
        let age_ms = age_ms.max(0.0);

        let Some(&(first_age, first_weight)) = self.points.first() else {
            return 1.0;
        };
        if age_ms <= first_age {
            return first_weight;
        }

        for pair in self.points.windows(2) {
            let (a0, w0) = pair[0];
            let (a1, w1) = pair[1];
            if age_ms <= a1 {
                let t = (age_ms - a0) / (a1 - a0);
                return w0 + (w1 - w0) * t;
            }
        }

        // Past the last control point: clamp.
        self.points[self.points.len() - 1].1
    }
}

#[cfg(test)]
mod tests {
    use super::DecayCurve;
    use foundation::time::MS_PER_HOUR;

    #[test]
    fn control_points_are_exact() {
        let curve = DecayCurve::default_fade();
        assert_eq!(curve.weight_at_age(0.0), 1.0);
        assert_eq!(curve.weight_at_age(6.0 * MS_PER_HOUR), 0.4);
        assert_eq!(curve.weight_at_age(24.0 * MS_PER_HOUR), 0.12);
    }

    #[test]
    fn interpolates_between_points() {
        let curve = DecayCurve::new(vec![(0.0, 1.0), (100.0, 0.0)]);
        assert!((curve.weight_at_age(50.0) - 0.5).abs() < 1e-12);
        assert!((curve.weight_at_age(25.0) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn clamps_past_the_last_point() {
        let curve = DecayCurve::default_fade();
        assert_eq!(curve.weight_at_age(1000.0 * MS_PER_HOUR), 0.12);
    }

    #[test]
    fn negative_age_counts_as_zero() {
        let curve = DecayCurve::default_fade();
        assert_eq!(curve.weight_at_age(-5.0 * MS_PER_HOUR), 1.0);
        assert_eq!(curve.weight(10_000, 0), 1.0);
    }

    #[test]
    fn weight_is_non_increasing_in_age() {
        let curve = DecayCurve::default_fade();
        let mut last = f64::INFINITY;
        for hour in 0..48 {
            let w = curve.weight_at_age(hour as f64 * MS_PER_HOUR);
            assert!(w <= last, "weight rose at hour {hour}");
            last = w;
        }
    }

    #[test]
    fn empty_curve_means_no_fade() {
        let curve = DecayCurve::new(Vec::new());
        assert_eq!(curve.weight_at_age(123.0), 1.0);
    }
}

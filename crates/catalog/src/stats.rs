//! Summary statistics over the filtered view (magnitude / depth histograms).

use serde::Serialize;

use crate::event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bin_start: f64,
    pub bin_width: f64,
    pub counts: Vec<u64>,
    pub summary: Summary,
}

impl Histogram {
    /// Returns `None` when there are no samples or `bin_count` is 0.
    pub fn build(values: &[f64], bin_count: usize) -> Option<Histogram> {
        if values.is_empty() || bin_count == 0 {
            return None;
        }

        let mut min = values[0];
        let mut max = values[0];
        let mut sum = 0.0;
        for &v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }

        // Degenerate range: one bin wide enough to hold everything.
        let bin_width = if max > min {
            (max - min) / bin_count as f64
        } else {
            1.0
        };

        let mut counts = vec![0u64; bin_count];
        for &v in values {
            let idx = (((v - min) / bin_width) as usize).min(bin_count - 1);
            counts[idx] += 1;
        }

        Some(Histogram {
            bin_start: min,
            bin_width,
            counts,
            summary: Summary {
                count: values.len(),
                min,
                max,
                mean: sum / values.len() as f64,
            },
        })
    }
}

/// Magnitude distribution; events without a magnitude are skipped.
pub fn magnitude_histogram(events: &[&Event], bin_count: usize) -> Option<Histogram> {
    let values: Vec<f64> = events.iter().filter_map(|e| e.magnitude).collect();
    Histogram::build(&values, bin_count)
}

/// Depth distribution in km; absent and negative depths are skipped.
pub fn depth_histogram(events: &[&Event], bin_count: usize) -> Option<Histogram> {
    let values: Vec<f64> = events
        .iter()
        .filter_map(|e| e.depth_km())
        .filter(|d| *d >= 0.0)
        .collect();
    Histogram::build(&values, bin_count)
}

#[cfg(test)]
mod tests {
    use super::{Histogram, depth_histogram, magnitude_histogram};
    use crate::event::{Event, Position};

    fn event(mag: Option<f64>, depth: Option<f64>) -> Event {
        Event {
            id: "e".to_string(),
            position: Some(Position {
                lon: 0.0,
                lat: 0.0,
                depth_km: depth,
            }),
            time_ms: 0,
            magnitude: mag,
            network: String::new(),
            tsunami: false,
            title: "t".to_string(),
            url: None,
        }
    }

    #[test]
    fn build_bins_values_and_summarizes() {
        let h = Histogram::build(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(h.counts, vec![2, 2]);
        assert_eq!(h.summary.count, 4);
        assert_eq!(h.summary.min, 1.0);
        assert_eq!(h.summary.max, 4.0);
        assert!((h.summary.mean - 2.5).abs() < 1e-9);
    }

    #[test]
    fn build_handles_identical_values() {
        let h = Histogram::build(&[5.0, 5.0], 4).unwrap();
        assert_eq!(h.counts, vec![2, 0, 0, 0]);
        assert_eq!(h.bin_width, 1.0);
    }

    #[test]
    fn empty_input_gives_no_histogram() {
        assert!(Histogram::build(&[], 10).is_none());
        assert!(Histogram::build(&[1.0], 0).is_none());
    }

    #[test]
    fn magnitude_histogram_skips_unknown_magnitudes() {
        let a = event(Some(2.0), None);
        let b = event(None, None);
        let refs: Vec<&Event> = vec![&a, &b];
        let h = magnitude_histogram(&refs, 2).unwrap();
        assert_eq!(h.summary.count, 1);
    }

    #[test]
    fn depth_histogram_skips_negative_depths() {
        let a = event(None, Some(10.0));
        let b = event(None, Some(-1.0));
        let c = event(None, None);
        let refs: Vec<&Event> = vec![&a, &b, &c];
        let h = depth_histogram(&refs, 2).unwrap();
        assert_eq!(h.summary.count, 1);
        assert_eq!(h.summary.min, 10.0);
    }
}

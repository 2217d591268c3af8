use pmu_clock::CycleDelta;
use serde::Serialize;

/// Distribution of a set of cycle measurements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub samples: usize,
    pub min: u32,
    pub max: u32,
    pub median: u32,
    pub mean: f64,
    pub stddev: f64,
    /// Coefficient of variation, stddev / mean. 0 when the mean is 0.
    pub cv: f64,
}

impl Summary {
    /// None for an empty set.
    pub fn from_deltas(deltas: &[CycleDelta]) -> Option<Self> {
        if deltas.is_empty() {
            return None;
        }
        let mut sorted: Vec<u32> = deltas.iter().map(CycleDelta::cycles).collect();
        sorted.sort_unstable();

        let n = sorted.len();
        let mean = sorted.iter().map(|&c| c as f64).sum::<f64>() / n as f64;
        let var = sorted
            .iter()
            .map(|&c| (c as f64 - mean).powi(2))
            .sum::<f64>()
            / n as f64;
        let stddev = var.sqrt();

        Some(Summary {
            samples: n,
            min: sorted[0],
            max: sorted[n - 1],
            median: sorted[n / 2],
            mean,
            stddev,
            cv: if mean > 0.0 { stddev / mean } else { 0.0 },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(Summary::from_deltas(&[]), None);
    }

    #[test]
    fn test_constant_samples() {
        let s = Summary::from_deltas(&[CycleDelta(4); 10]).unwrap();
        assert_eq!((s.min, s.max, s.median), (4, 4, 4));
        assert_eq!(s.mean, 4.0);
        assert_eq!(s.stddev, 0.0);
        assert_eq!(s.cv, 0.0);
    }

    #[test]
    fn test_spread() {
        let deltas: Vec<CycleDelta> = [2u32, 4, 4, 4, 5, 5, 7, 9].map(CycleDelta).to_vec();
        let s = Summary::from_deltas(&deltas).unwrap();
        assert_eq!(s.samples, 8);
        assert_eq!(s.min, 2);
        assert_eq!(s.max, 9);
        assert_eq!(s.median, 5);
        assert_relative_eq!(s.mean, 5.0);
        assert_relative_eq!(s.stddev, 2.0);
        assert_relative_eq!(s.cv, 0.4);
    }
}

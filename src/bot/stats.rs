//! Aggregation of one request's retained ratings into a summary record.

use crate::types::{StatsError, SummaryRecord};

pub fn mean(values: &[f64]) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Most frequent value. Ties resolve to the smallest tied value, which
/// keeps the result deterministic and independent of input order.
pub fn mode(values: &[f64]) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut best = sorted[0];
    let mut best_len = 0usize;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        // Strictly-greater keeps the earliest (smallest) run on ties.
        if j - i > best_len {
            best_len = j - i;
            best = sorted[i];
        }
        i = j;
    }
    Ok(best)
}

/// Median with standard even/odd interpolation.
pub fn median(values: &[f64]) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Ok(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// Sample standard deviation (Bessel-corrected, N-1 denominator).
pub fn sample_stdev(values: &[f64]) -> Result<f64, StatsError> {
    match values.len() {
        0 => Err(StatsError::EmptyInput),
        1 => Err(StatsError::InsufficientData {
            what: "sample standard deviation",
            needed: 2,
            got: 1,
        }),
        n => {
            let m = mean(values)?;
            let variance =
                values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
            Ok(variance.sqrt())
        }
    }
}

impl SummaryRecord {
    /// Aggregate a retained rating set.
    ///
    /// Fails with [`StatsError::EmptyInput`] on zero ratings and
    /// [`StatsError::InsufficientData`] on a single rating (the sample
    /// standard deviation needs two). Callers substitute the fixed
    /// "no ratings found" reply on either failure.
    pub fn from_ratings(ratings: &[f64]) -> Result<Self, StatsError> {
        if ratings.is_empty() {
            return Err(StatsError::EmptyInput);
        }
        Ok(Self {
            count: ratings.len(),
            mean: mean(ratings)?,
            mode: mode(ratings)?,
            median: median(ratings)?,
            stdev: sample_stdev(ratings)?,
            min: ratings.iter().copied().fold(f64::INFINITY, f64::min),
            max: ratings.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn summary_over_known_values() {
        let summary = SummaryRecord::from_ratings(&[5.0, 6.5, 7.5]).expect("summary computes");
        assert_eq!(summary.count, 3);
        assert!(close(summary.mean, 19.0 / 3.0));
        assert!(close(summary.median, 6.5));
        assert!(close(summary.min, 5.0));
        assert!(close(summary.max, 7.5));
    }

    #[test]
    fn fields_are_order_independent() {
        let a = SummaryRecord::from_ratings(&[5.0, 6.5, 7.5, 6.5]).expect("summary");
        let b = SummaryRecord::from_ratings(&[6.5, 7.5, 6.5, 5.0]).expect("summary");
        assert_eq!(a, b);
    }

    #[test]
    fn mode_prefers_most_frequent() {
        assert_eq!(mode(&[5.0, 6.0, 6.0, 7.0]), Ok(6.0));
    }

    #[test]
    fn mode_ties_resolve_to_smallest() {
        // 5.0 and 7.0 both appear twice; the smaller wins.
        assert_eq!(mode(&[7.0, 5.0, 7.0, 5.0, 6.0]), Ok(5.0));
        assert_eq!(mode(&[3.0, 1.0, 2.0]), Ok(1.0));
    }

    #[test]
    fn median_interpolates_even_counts() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Ok(2.5));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Ok(2.0));
    }

    #[test]
    fn stdev_is_bessel_corrected() {
        let result = sample_stdev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).expect("stdev");
        // Sample variance of this set is 32/7.
        assert!(close(result, (32.0_f64 / 7.0).sqrt()));
    }

    #[test]
    fn single_element_fails_only_for_stdev() {
        assert_eq!(mean(&[4.0]), Ok(4.0));
        assert_eq!(median(&[4.0]), Ok(4.0));
        assert_eq!(mode(&[4.0]), Ok(4.0));
        assert_eq!(
            sample_stdev(&[4.0]),
            Err(StatsError::InsufficientData {
                what: "sample standard deviation",
                needed: 2,
                got: 1,
            })
        );
        assert_eq!(
            SummaryRecord::from_ratings(&[4.0]),
            Err(StatsError::InsufficientData {
                what: "sample standard deviation",
                needed: 2,
                got: 1,
            })
        );
    }

    #[test]
    fn empty_input_is_an_error_everywhere() {
        assert_eq!(mean(&[]), Err(StatsError::EmptyInput));
        assert_eq!(mode(&[]), Err(StatsError::EmptyInput));
        assert_eq!(median(&[]), Err(StatsError::EmptyInput));
        assert_eq!(sample_stdev(&[]), Err(StatsError::EmptyInput));
        assert_eq!(SummaryRecord::from_ratings(&[]), Err(StatsError::EmptyInput));
    }
}

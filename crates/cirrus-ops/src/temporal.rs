use crate::execute::{DispatchError, ExecuteExt, ExecutionStrategy};

/// A value paired with the time it was observed at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timestamped<T> {
    /// Observation time in seconds.
    pub stamp: f64,
    /// The observed value.
    pub value: T,
}

impl<T> Timestamped<T> {
    /// Pair a value with its observation time.
    pub fn new(stamp: f64, value: T) -> Self {
        Self { stamp, value }
    }
}

/// One element of the left-hand series together with its nearest-in-time
/// match from the right-hand series, when one exists within tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct Associated<T, U> {
    /// The left-hand element the match was searched for.
    pub item: Timestamped<T>,
    /// The closest right-hand element within tolerance, if any.
    pub matched: Option<Timestamped<U>>,
}

/// Pair every element of `series_a` with its closest-in-time element of
/// `series_b`.
///
/// Returns one entry per element of `series_a`, in the same order. Among
/// equally close candidates the first in `series_b` order wins. Candidates
/// farther than `max_delta` (and every candidate, when `series_b` is empty)
/// leave the entry unmatched; a negative `max_delta` therefore matches
/// nothing. Both series are expected pre-sorted ascending by stamp; no
/// sorting happens here.
///
/// Every element of `series_a` is scanned against all of `series_b`, an
/// O(|A|*|B|) ceiling to keep in mind for large series. The per-element
/// scans are independent and run through the dispatcher under `strategy`,
/// each writing only its own output slot; `series_b` is read-only
/// throughout.
///
/// Example:
///
/// ```
/// use cirrus_ops::execute::ExecutionStrategy;
/// use cirrus_ops::temporal::{associate, Timestamped};
///
/// let scans = vec![Timestamped::new(1.0, "scan")];
/// let poses = vec![Timestamped::new(1.2, "pose"), Timestamped::new(4.0, "pose")];
///
/// let associated = associate(&scans, &poses, 0.5, ExecutionStrategy::Serial).unwrap();
/// assert_eq!(associated[0].matched.as_ref().map(|m| m.stamp), Some(1.2));
/// ```
pub fn associate<T, U>(
    series_a: &[Timestamped<T>],
    series_b: &[Timestamped<U>],
    max_delta: f64,
    strategy: ExecutionStrategy,
) -> Result<Vec<Associated<T, U>>, DispatchError>
where
    T: Clone + Sync,
    U: Clone + Send + Sync,
{
    let mut matches: Vec<Option<Timestamped<U>>> = vec![None; series_a.len()];
    series_a.execute_with(strategy, &mut matches, |item, slot| {
        *slot = nearest_in_time(item.stamp, series_b, max_delta).cloned();
    })?;

    log::debug!(
        "associated {} of {} elements within {max_delta}",
        matches.iter().filter(|m| m.is_some()).count(),
        series_a.len()
    );

    Ok(series_a
        .iter()
        .zip(matches)
        .map(|(item, matched)| Associated {
            item: item.clone(),
            matched,
        })
        .collect())
}

fn nearest_in_time<U>(
    stamp: f64,
    series: &[Timestamped<U>],
    max_delta: f64,
) -> Option<&Timestamped<U>> {
    let mut best: Option<(&Timestamped<U>, f64)> = None;
    for candidate in series {
        let delta = (candidate.stamp - stamp).abs();
        // strict comparison keeps the first of equally close candidates
        if best.map_or(true, |(_, best_delta)| delta < best_delta) {
            best = Some((candidate, delta));
        }
    }
    match best {
        Some((candidate, delta)) if delta <= max_delta => Some(candidate),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(stamps: &[f64]) -> Vec<Timestamped<usize>> {
        stamps
            .iter()
            .enumerate()
            .map(|(i, stamp)| Timestamped::new(*stamp, i))
            .collect()
    }

    #[test]
    fn test_associate_within_tolerance() {
        let series_a = series(&[1.0, 5.0]);
        let series_b = series(&[1.2, 4.0, 9.0]);

        let associated = associate(&series_a, &series_b, 0.5, ExecutionStrategy::Serial).unwrap();
        assert_eq!(associated.len(), 2);

        let first = associated[0].matched.as_ref().unwrap();
        assert_eq!(first.stamp, 1.2);
        assert_eq!(first.value, 0);

        // closest candidate to 5.0 is 4.0, but its delta of 1.0 exceeds 0.5
        assert!(associated[1].matched.is_none());
    }

    #[test]
    fn test_associate_empty_right_series() {
        let series_a = series(&[1.0, 2.0, 3.0]);
        let series_b: Vec<Timestamped<usize>> = Vec::new();

        let associated = associate(&series_a, &series_b, 10.0, ExecutionStrategy::Serial).unwrap();
        assert_eq!(associated.len(), 3);
        assert!(associated.iter().all(|a| a.matched.is_none()));
    }

    #[test]
    fn test_associate_preserves_left_order() {
        let series_a = series(&[0.0, 1.0, 2.0]);
        let series_b = series(&[0.1, 1.1, 2.1]);

        let associated = associate(&series_a, &series_b, 0.2, ExecutionStrategy::Serial).unwrap();
        let stamps: Vec<f64> = associated.iter().map(|a| a.item.stamp).collect();
        assert_eq!(stamps, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_tie_breaks_to_first_candidate() {
        let series_a = series(&[2.0]);
        let series_b = series(&[1.5, 2.5]);

        let associated = associate(&series_a, &series_b, 1.0, ExecutionStrategy::Serial).unwrap();
        let matched = associated[0].matched.as_ref().unwrap();
        assert_eq!(matched.stamp, 1.5);
        assert_eq!(matched.value, 0);
    }

    #[test]
    fn test_matches_respect_max_delta() {
        let series_a: Vec<Timestamped<usize>> =
            (0..100).map(|i| Timestamped::new(i as f64 * 0.37, i)).collect();
        let series_b: Vec<Timestamped<usize>> =
            (0..60).map(|i| Timestamped::new(i as f64 * 0.61, i)).collect();
        let max_delta = 0.1;

        let associated =
            associate(&series_a, &series_b, max_delta, ExecutionStrategy::Serial).unwrap();
        for entry in &associated {
            if let Some(matched) = &entry.matched {
                assert!((entry.item.stamp - matched.stamp).abs() <= max_delta);
            }
        }
    }

    #[test]
    fn test_parallel_matches_serial() {
        let series_a: Vec<Timestamped<usize>> =
            (0..200).map(|i| Timestamped::new(i as f64 * 0.1, i)).collect();
        let series_b: Vec<Timestamped<usize>> =
            (0..50).map(|i| Timestamped::new(i as f64 * 0.43, i)).collect();

        let serial = associate(&series_a, &series_b, 0.2, ExecutionStrategy::Serial).unwrap();
        let parallel = associate(&series_a, &series_b, 0.2, ExecutionStrategy::Parallel).unwrap();
        assert_eq!(serial, parallel);
    }
}

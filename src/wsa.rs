//! Weighted switching activity during shift
//!
//! Activity simulators compare patterns two by two: 0 with 1, 2 with 3, and so on. To observe
//! every shift cycle, the scan mapping rows are doubled so that each consecutive pair of rows
//! forms one of these comparisons.
//!
//! ```
//! use scgroup::wsa::expand_for_wsa;
//! assert_eq!(expand_for_wsa(&['a', 'b', 'c']), vec!['a', 'b', 'b', 'c']);
//! ```

/// Double the interior rows of a scan mapping
///
/// The result has `2(n-1)` rows: row `i` of the input appears at positions `2i - 1` and `2i`,
/// except the first and last rows which appear once.
pub fn expand_for_wsa<T: Clone>(rows: &[T]) -> Vec<T> {
    if rows.len() < 2 {
        return Vec::new();
    }
    let mut ret = Vec::with_capacity(2 * (rows.len() - 1));
    ret.push(rows[0].clone());
    for r in &rows[1..rows.len() - 1] {
        ret.push(r.clone());
        ret.push(r.clone());
    }
    ret.push(rows[rows.len() - 1].clone());
    ret
}

/// Simulated activity of the aggressors of each scan cell
pub trait ActivityTrace {
    /// Number of simulated shift patterns
    fn nb_patterns(&self) -> usize;

    /// Weighted switching activity of the aggressors of a scan cell for a pattern
    fn activity(&self, chain: usize, cell: usize, pattern: usize) -> f64;
}

/// Largest activity difference between adjacent scan cells of a group
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActivityReport {
    /// Largest difference found
    pub max_difference: f64,
    /// Activity of the first scan cell of the worst pair
    pub first_activity: f64,
    /// Activity of the second scan cell of the worst pair
    pub second_activity: f64,
}

/// Measure the activity difference between adjacent scan cells of the chains in a group
///
/// Only the chains of `group` shift together, so other chains do not contribute.
/// `chain_lengths` gives the number of scan cells of each chain.
pub fn validate_grouping<A: ActivityTrace>(
    trace: &A,
    chain_lengths: &[usize],
    clocking: &[i32],
    group: usize,
) -> ActivityReport {
    assert_eq!(chain_lengths.len(), clocking.len());
    let mut ret = ActivityReport::default();
    for (chain, len) in chain_lengths.iter().enumerate() {
        if clocking[chain] != group as i32 {
            continue;
        }
        for pattern in 0..trace.nb_patterns() {
            for cell in 1..*len {
                let a = trace.activity(chain, cell - 1, pattern);
                let b = trace.activity(chain, cell, pattern);
                if (a - b).abs() > ret.max_difference {
                    ret = ActivityReport {
                        max_difference: (a - b).abs(),
                        first_activity: a,
                        second_activity: b,
                    };
                }
            }
        }
    }
    tracing::info!(
        group,
        max_difference = ret.max_difference,
        first = ret.first_activity,
        second = ret.second_activity,
        "Activity difference"
    );
    ret
}

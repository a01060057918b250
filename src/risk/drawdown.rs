//! Path-wise maximum drawdown.
//!
//! Drawdown at step `t` is `(peak_t - V_t) / peak_t` with `peak_t` the running
//! maximum of the path up to `t`, including the starting value.

use nalgebra::DMatrix;

/// Running drawdown state for one value path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawdownTracker {
    peak: f64,
    max_drawdown: f64,
    max_drawdown_step: usize,
    steps: usize,
}

impl DrawdownTracker {
    /// Starts tracking at `initial_value`.
    pub fn with_initial(initial_value: f64) -> Self {
        Self {
            peak: initial_value,
            max_drawdown: 0.0,
            max_drawdown_step: 0,
            steps: 1,
        }
    }

    pub fn update(&mut self, value: f64) {
        let step = self.steps;
        self.steps += 1;
        if value > self.peak {
            self.peak = value;
            return;
        }
        let dd = relative_drawdown(self.peak, value);
        if dd > self.max_drawdown {
            self.max_drawdown = dd;
            self.max_drawdown_step = step;
        }
    }

    /// Largest drawdown seen, as a fraction of the peak.
    #[inline]
    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    /// Step at which the largest drawdown occurred (0 if none).
    #[inline]
    pub fn max_drawdown_step(&self) -> usize {
        self.max_drawdown_step
    }

    #[inline]
    pub fn peak(&self) -> f64 {
        self.peak
    }
}

#[inline]
fn relative_drawdown(peak: f64, value: f64) -> f64 {
    if peak > 0.0 {
        (peak - value) / peak
    } else {
        0.0
    }
}

/// Maximum drawdown of a single value path; `0.0` for an empty path.
pub fn max_drawdown(path: &[f64]) -> f64 {
    let Some((&first, rest)) = path.split_first() else {
        return 0.0;
    };
    let mut tracker = DrawdownTracker::with_initial(first);
    for &v in rest {
        tracker.update(v);
    }
    tracker.max_drawdown()
}

/// Maximum drawdown of every row of a `paths x steps` value table.
///
/// Walks the table column by column, carrying one running peak per path.
pub fn max_drawdowns(values: &DMatrix<f64>) -> Vec<f64> {
    let n_paths = values.nrows();
    if values.ncols() == 0 {
        return vec![0.0; n_paths];
    }
    let mut peak: Vec<f64> = values.column(0).iter().copied().collect();
    let mut worst = vec![0.0; n_paths];
    for col in values.column_iter().skip(1) {
        for (p, &v) in col.iter().enumerate() {
            if v > peak[p] {
                peak[p] = v;
            } else {
                let dd = relative_drawdown(peak[p], v);
                if dd > worst[p] {
                    worst[p] = dd;
                }
            }
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn drawdown_is_measured_from_running_peak() {
        let path = [100.0, 110.0, 99.0, 105.0, 88.0, 120.0];
        // worst: peak 110 -> 88
        assert_relative_eq!(max_drawdown(&path), 0.2, epsilon = 1.0e-12);

        let mut t = DrawdownTracker::with_initial(100.0);
        for v in &path[1..] {
            t.update(*v);
        }
        assert_eq!(t.max_drawdown_step(), 4);
        assert_eq!(t.peak(), 120.0);
    }

    #[test]
    fn monotone_paths_have_no_drawdown() {
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(max_drawdown(&[5.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn batched_rows_match_single_path_walk() {
        let rows = [
            [100.0, 90.0, 95.0, 80.0],
            [100.0, 101.0, 102.0, 103.0],
            [100.0, 120.0, 60.0, 130.0],
        ];
        let table = DMatrix::from_fn(3, 4, |r, c| rows[r][c]);
        let batched = max_drawdowns(&table);
        for (r, row) in rows.iter().enumerate() {
            assert_eq!(batched[r], max_drawdown(row));
        }
        assert_relative_eq!(batched[2], 0.5, epsilon = 1.0e-12);
    }

    #[test]
    fn single_column_table_has_zero_drawdown() {
        let table = DMatrix::from_element(4, 1, 10_000.0);
        assert_eq!(max_drawdowns(&table), vec![0.0; 4]);
    }
}

//! VaR / CVaR reference tests.
//!
//! Hand-computed empirical values (linear interpolation at rank c * (n - 1))
//! and sampling checks against the standard normal:
//! VaR_c = Phi^{-1}(c), CVaR_c = phi(Phi^{-1}(c)) / (1 - c).

use approx::assert_relative_eq;
use mcrisk::risk::{conditional_value_at_risk, tail_risk, value_at_risk};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

struct NormalTailCase {
    confidence: f64,
    expected_var: f64,
    expected_cvar: f64,
}

fn standard_normal_cases() -> Vec<NormalTailCase> {
    vec![
        NormalTailCase {
            confidence: 0.90,
            expected_var: 1.2815515655446,
            expected_cvar: 1.7549833193249,
        },
        NormalTailCase {
            confidence: 0.95,
            expected_var: 1.6448536269515,
            expected_cvar: 2.0627128075074,
        },
        NormalTailCase {
            confidence: 0.99,
            expected_var: 2.3263478740408,
            expected_cvar: 2.6652142203458,
        },
    ]
}

#[test]
fn sampled_normal_tail_matches_closed_form() {
    let mut rng = StdRng::seed_from_u64(7);
    let pnl: Vec<f64> = (0..200_000).map(|_| StandardNormal.sample(&mut rng)).collect();
    for case in standard_normal_cases() {
        let t = tail_risk(&pnl, case.confidence).unwrap();
        assert_relative_eq!(t.var, case.expected_var, max_relative = 0.02);
        assert_relative_eq!(t.cvar, case.expected_cvar, max_relative = 0.03);
    }
}

#[test]
fn hundred_point_grid_reference() {
    // P&L = -50, -49, ..., 49; losses sorted = -49, ..., 50.
    let pnl: Vec<f64> = (-50..50).map(|x| x as f64).collect();

    // rank 0.95 * 99 = 94.05 -> -49 + 94.05
    assert_relative_eq!(value_at_risk(&pnl, 0.95).unwrap(), 45.05, epsilon = 1.0e-9);
    // tail: 46..=50
    assert_relative_eq!(conditional_value_at_risk(&pnl, 0.95).unwrap(), 48.0, epsilon = 1.0e-12);

    // rank 0.99 * 99 = 98.01 -> 49.01; tail is {50}
    assert_relative_eq!(value_at_risk(&pnl, 0.99).unwrap(), 49.01, epsilon = 1.0e-9);
    assert_eq!(conditional_value_at_risk(&pnl, 0.99).unwrap(), 50.0);
}

#[test]
fn tail_with_exactly_one_sample_is_handled() {
    let pnl = [-10.0, 1.0, 2.0, 3.0];
    let t = tail_risk(&pnl, 0.99).unwrap();
    assert_eq!(t.tail_samples, 1);
    assert_eq!(t.cvar, 10.0);
    // rank 2.97 between losses -1 and 10
    assert_relative_eq!(t.var, -1.0 + 0.97 * 11.0, epsilon = 1.0e-12);
}

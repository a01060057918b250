use mcrisk::risk::{probability_of_loss, tail_risk};
use proptest::prelude::*;

proptest! {
    #[test]
    fn cvar_dominates_var_and_both_are_non_negative(
        pnl in prop::collection::vec(-1.0e4..1.0e4f64, 1..300),
        c in 0.5..0.999f64,
    ) {
        let t = tail_risk(&pnl, c).unwrap();
        prop_assert!(t.var >= 0.0);
        prop_assert!(t.cvar >= t.var);
        prop_assert!(t.tail_samples >= 1 && t.tail_samples <= pnl.len());
    }

    #[test]
    fn higher_confidence_never_reports_less_loss(
        pnl in prop::collection::vec(-1.0e4..1.0e4f64, 1..300),
        c1 in 0.5..0.999f64,
        c2 in 0.5..0.999f64,
    ) {
        let (lo, hi) = if c1 <= c2 { (c1, c2) } else { (c2, c1) };
        let a = tail_risk(&pnl, lo).unwrap();
        let b = tail_risk(&pnl, hi).unwrap();
        prop_assert!(b.var >= a.var);
        // Tail means are sums over nested top sets; allow summation rounding.
        prop_assert!(b.cvar >= a.cvar - 1.0e-9 * a.cvar.abs().max(1.0));
    }

    #[test]
    fn probability_of_loss_is_a_fraction(
        pnl in prop::collection::vec(-1.0e4..1.0e4f64, 0..300),
    ) {
        let p = probability_of_loss(&pnl);
        prop_assert!((0.0..=1.0).contains(&p));
    }
}

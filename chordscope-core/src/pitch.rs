//! # Pitch Detection Module
//!
//! Recovers a fundamental frequency from a handful of spectral peak
//! frequencies by treating them as near-integer multiples of an unknown
//! fundamental and folding them together pairwise (an approximate highest
//! common factor).

use crate::error::{Error, Result};

/// Largest `max / min` ratio at which two peaks are still considered related.
pub const DEFAULT_ACCURACY_THRESHOLD: f32 = 10.0;

/// Estimates the fundamental shared by `inputs`.
///
/// For two values the ratio `max / min` is formed. If it exceeds
/// `accuracy_threshold` the peaks are judged unrelated and the estimate is
/// `0.0`; otherwise the estimate is `inputs[0] / ratio`. Longer inputs are
/// folded from the back: the estimate for `inputs[1..]` is combined with
/// `inputs[0]` by the same two-value rule.
///
/// # Arguments
/// * `inputs` - Candidate peak frequencies in Hz
/// * `accuracy_threshold` - Largest ratio accepted between two values
///
/// # Returns
/// * `Ok(freq)` - The estimate, or `0.0` when no harmonic relation holds
/// * `Err(InvalidArgument)` - Fewer than two inputs
pub fn approx_hcf(inputs: &[f32], accuracy_threshold: f32) -> Result<f32> {
    if inputs.len() < 2 {
        log::debug!("approx_hcf called with {} inputs.", inputs.len());
        return Err(Error::invalid(
            "at least two inputs are required to compute HCF",
        ));
    }

    if inputs.len() == 2 {
        return Ok(pair_hcf(inputs[0], inputs[1], accuracy_threshold));
    }

    let smaller_hcf = approx_hcf(&inputs[1..], accuracy_threshold)?;
    Ok(pair_hcf(inputs[0], smaller_hcf, accuracy_threshold))
}

fn pair_hcf(first: f32, second: f32, accuracy_threshold: f32) -> f32 {
    let (lo, hi) = if first < second { (first, second) } else { (second, first) };
    if !(lo > 0.0 && hi.is_finite()) {
        return 0.0;
    }

    let ratio = hi / lo;
    if ratio > accuracy_threshold {
        log::trace!("Inputs {} and {} are not accurate enough for HCF.", first, second);
        return 0.0;
    }
    first / ratio
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_input_is_rejected() {
        let err = approx_hcf(&[15.0], 1e-3).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidArgument("at least two inputs are required to compute HCF".into())
        );
        assert!(approx_hcf(&[], 10.0).is_err());
    }

    #[test]
    fn mismatched_ratios_return_zero() {
        assert_eq!(approx_hcf(&[15.0, 10.0, 4.5], 1.0).unwrap(), 0.0);
        assert_eq!(approx_hcf(&[1000.0, 10.0], 10.0).unwrap(), 0.0);
    }

    #[test]
    fn pair_rule_divides_first_input_by_ratio() {
        // 880 / (880 / 440) = 440
        assert!((approx_hcf(&[880.0, 440.0], 10.0).unwrap() - 440.0).abs() < 1e-3);
        // 440 / 2 = 220
        assert!((approx_hcf(&[440.0, 880.0], 10.0).unwrap() - 220.0).abs() < 1e-3);
    }

    #[test]
    fn equal_inputs_are_their_own_fundamental() {
        assert!((approx_hcf(&[330.0, 330.0, 330.0], 5.0).unwrap() - 330.0).abs() < 1e-3);
    }

    #[test]
    fn recovers_fundamental_when_it_is_the_last_candidate() {
        let partials = [660.0, 880.0, 1320.0, 220.0];
        let estimate = approx_hcf(&partials, 10.0).unwrap();
        assert!((estimate - 220.0).abs() < 1e-2, "estimate {estimate}");
    }

    #[test]
    fn fold_order_matters() {
        // 1320 and 880 fold to 586.7 first, which is not a multiple of 440.
        let estimate = approx_hcf(&[440.0, 880.0, 1320.0], 10.0).unwrap();
        assert!((estimate - 330.0).abs() < 1e-2, "estimate {estimate}");
    }

    #[test]
    fn zero_candidate_collapses_to_zero() {
        assert_eq!(approx_hcf(&[440.0, 0.0], 10.0).unwrap(), 0.0);
        assert_eq!(approx_hcf(&[0.0, 0.0], 10.0).unwrap(), 0.0);
    }
}

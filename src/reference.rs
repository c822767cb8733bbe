use log::debug;

use crate::error::{Error, Result};

/// Sampled piecewise-constant reference.
///
/// ```text
///           | setpoints[0]      0 <= t < T_1
/// ref(t) = <  ...
///           | setpoints[n-1]    T_1 + ... + T_(n-1) <= t <= T_1 + ... + T_n
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub samples: Vec<f64>,
    /// Total duration `Ts * sum(n_i)`, rounded to 3 decimals.
    pub horizon: f64,
    pub ts: f64,
}

impl Reference {
    /// Sample instants `k * Ts` matching `samples`.
    pub fn time(&self) -> Vec<f64> {
        (0..self.samples.len()).map(|k| k as f64 * self.ts).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Upper bound on the length of a sampled reference.
pub const MAX_SAMPLES: usize = 100_000_000;

fn too_long(count: f64) -> Error {
    Error::ReferenceTooLong {
        count,
        limit: MAX_SAMPLES,
    }
}

/// Number of samples a hold of `duration` takes, ties rounding to even.
pub fn sample_count(duration: f64, ts: f64) -> Result<usize> {
    let n = (duration / ts).round_ties_even();
    if !n.is_finite() || n > MAX_SAMPLES as f64 {
        return Err(too_long(n));
    }
    Ok(n as usize)
}

/// Round to 3 decimals, ties to even.
fn round3(x: f64) -> f64 {
    (x * 1000.0).round_ties_even() / 1000.0
}

/// Sample a piecewise-constant reference with period `ts`.
///
/// Each setpoint is held for `round(duration / ts)` samples; a hold that rounds
/// to zero samples is skipped. One extra sample with the last setpoint closes
/// the interval on the right.
pub fn piecewise_constant(setpoints: &[f64], durations: &[f64], ts: f64) -> Result<Reference> {
    if setpoints.len() != durations.len() {
        return Err(Error::LengthMismatch {
            setpoints: setpoints.len(),
            durations: durations.len(),
        });
    }
    let Some(&last) = setpoints.last() else {
        return Err(Error::EmptyReference);
    };
    if !(ts.is_finite() && ts > 0.0) {
        return Err(Error::InvalidSamplePeriod(ts));
    }
    if let Some((index, &value)) = durations
        .iter()
        .enumerate()
        .find(|(_, d)| !(d.is_finite() && **d >= 0.0))
    {
        return Err(Error::NegativeDuration { index, value });
    }

    let n_samples = durations
        .iter()
        .map(|d| sample_count(*d, ts))
        .collect::<Result<Vec<usize>>>()?;
    debug!("piecewise reference: ts={ts}, samples per setpoint {n_samples:?}");

    let total = n_samples
        .iter()
        .try_fold(0usize, |acc, &n| acc.checked_add(n))
        .filter(|&total| total < MAX_SAMPLES)
        .ok_or_else(|| too_long(n_samples.iter().map(|&n| n as f64).sum()))?;
    let mut samples = Vec::with_capacity(total + 1);
    for (&value, &n) in setpoints.iter().zip(&n_samples) {
        samples.extend(std::iter::repeat(value).take(n));
    }
    samples.push(last);

    Ok(Reference {
        samples,
        horizon: round3(total as f64 * ts),
        ts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn two_setpoints() {
        let r = piecewise_constant(&[5.0, 10.0], &[2.0, 1.0], 0.5).unwrap();
        assert_eq!(r.samples, vec![5.0, 5.0, 5.0, 5.0, 10.0, 10.0, 10.0]);
        assert_eq!(r.len(), 7);
        assert_eq!(r.horizon, 3.0);
        assert_eq!(r.time(), vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0]);
    }

    #[test]
    fn ties_round_to_even() {
        assert_eq!(sample_count(1.25, 0.5).unwrap(), 2);
        assert_eq!(sample_count(1.75, 0.5).unwrap(), 4);
        assert_eq!(sample_count(1.3, 0.5).unwrap(), 3);
        let r = piecewise_constant(&[1.0], &[1.25], 0.5).unwrap();
        assert_eq!(r.samples, vec![1.0; 3]);
        assert_eq!(r.horizon, 1.0);
    }

    #[test]
    fn zero_sample_hold_is_skipped() {
        let r = piecewise_constant(&[1.0, 2.0, 3.0], &[0.1, 0.01, 0.2], 0.1).unwrap();
        assert_eq!(r.samples, vec![1.0, 3.0, 3.0, 3.0]);
        assert_relative_eq!(r.horizon, 0.3);
    }

    #[test]
    fn trailing_sample_is_last_setpoint() {
        let r = piecewise_constant(&[1.0, 2.0], &[0.2, 0.0], 0.1).unwrap();
        assert_eq!(r.samples, vec![1.0, 1.0, 2.0]);
        let r = piecewise_constant(&[4.0], &[0.0], 0.1).unwrap();
        assert_eq!(r.samples, vec![4.0]);
        assert_eq!(r.horizon, 0.0);
    }

    #[test]
    fn horizon_is_rounded_to_milliseconds() {
        let r = piecewise_constant(&[0.0, 1.0], &[1.0, 1.0], 0.001).unwrap();
        assert_eq!(r.len(), 2001);
        assert_eq!(r.horizon, 2.0);
    }

    #[test]
    fn oversized_references_are_rejected() {
        // each hold alone exceeds the limit
        assert!(matches!(
            piecewise_constant(&[1.0, 2.0], &[1e300, 1e300], 1e-300),
            Err(Error::ReferenceTooLong { .. })
        ));
        // subnormal sample period, the ratio is infinite
        assert!(matches!(
            piecewise_constant(&[1.0], &[1.0], 1e-320),
            Err(Error::ReferenceTooLong { .. })
        ));
        assert!(matches!(
            piecewise_constant(&[1.0], &[1e12], 1e-3),
            Err(Error::ReferenceTooLong { .. })
        ));
        // holds within the limit whose sum is not
        let half = (MAX_SAMPLES / 2) as f64;
        match piecewise_constant(&[1.0, 2.0, 3.0], &[half, half, half], 1.0) {
            Err(Error::ReferenceTooLong { count, limit }) => {
                assert_eq!(limit, MAX_SAMPLES);
                assert_eq!(count, 3.0 * half);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            sample_count(f64::MAX, f64::MIN_POSITIVE),
            Err(Error::ReferenceTooLong { .. })
        ));
    }

    #[test]
    fn invalid_inputs() {
        assert!(matches!(
            piecewise_constant(&[1.0, 2.0], &[1.0], 0.1),
            Err(Error::LengthMismatch {
                setpoints: 2,
                durations: 1
            })
        ));
        assert!(matches!(
            piecewise_constant(&[], &[], 0.1),
            Err(Error::EmptyReference)
        ));
        assert!(matches!(
            piecewise_constant(&[1.0], &[1.0], 0.0),
            Err(Error::InvalidSamplePeriod(_))
        ));
        assert!(matches!(
            piecewise_constant(&[1.0], &[1.0], f64::NAN),
            Err(Error::InvalidSamplePeriod(_))
        ));
        assert!(matches!(
            piecewise_constant(&[1.0, 2.0], &[1.0, -1.0], 0.1),
            Err(Error::NegativeDuration { index: 1, .. })
        ));
    }
}

//! Mastery smoothing.

use super::MasteryModel;
use crate::profile::INITIAL_MASTERY;

/// Exponential moving average: `new = old * (1 - alpha) + correctness * alpha`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    pub alpha: f64,
}

impl Ema {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }
}

impl Default for Ema {
    fn default() -> Self {
        Self { alpha: 0.3 }
    }
}

impl MasteryModel for Ema {
    fn name(&self) -> &'static str {
        "ema"
    }

    fn initial(&self) -> f64 {
        INITIAL_MASTERY
    }

    fn update(&self, current: f64, correctness: f64, _attempts: u32) -> f64 {
        let alpha = self.alpha.clamp(0.0, 1.0);
        let correctness = correctness.clamp(0.0, 1.0);
        (current * (1.0 - alpha) + correctness * alpha).clamp(0.0, 1.0)
    }
}

/// Plain average of every attempt; early attempts weigh as much as late ones.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean;

impl MasteryModel for RunningMean {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn initial(&self) -> f64 {
        INITIAL_MASTERY
    }

    fn update(&self, current: f64, correctness: f64, attempts: u32) -> f64 {
        let n = f64::from(attempts) + 1.0;
        (current + (correctness.clamp(0.0, 1.0) - current) / n).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_moves_toward_correctness() {
        let ema = Ema::new(0.3);
        let m = ema.update(0.0, 1.0, 0);
        assert!((m - 0.3).abs() < 1e-12);
        let m = ema.update(m, 1.0, 1);
        assert!((m - 0.51).abs() < 1e-12);
        let m = ema.update(m, 0.0, 2);
        assert!((m - 0.357).abs() < 1e-12);
    }

    #[test]
    fn ema_converges_but_never_overshoots() {
        let ema = Ema::default();
        let mut m = ema.initial();
        for i in 0..200 {
            m = ema.update(m, 1.0, i);
            assert!(m <= 1.0);
        }
        assert!(m > 0.999);
    }

    #[test]
    fn running_mean_weighs_attempts_equally() {
        let mean = RunningMean;
        let mut m = mean.initial();
        for (i, c) in [1.0, 0.0, 1.0, 1.0].into_iter().enumerate() {
            m = mean.update(m, c, i as u32);
        }
        assert!((m - 0.75).abs() < 1e-12);
    }
}

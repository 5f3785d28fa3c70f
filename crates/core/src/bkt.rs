use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum BktError {
    #[error("{name} must be a probability in [0, 1], got {provided}")]
    InvalidProbability { name: &'static str, provided: f64 },
}

//
// ─── PARAMETERS ────────────────────────────────────────────────────────────────
//

/// Bayesian Knowledge Tracing model parameters.
///
/// * `initial_mastery` - P(L0), mastery assumed for a topic never seen before
/// * `learn` - P(T), chance of moving to the mastered state after an attempt
/// * `guess` - P(G), chance an unmastered learner answers correctly
/// * `slip` - P(S), chance a mastered learner answers incorrectly
///
/// # Examples
///
/// ```
/// # use tutor_core::bkt::BktParams;
/// let params = BktParams::default();
/// assert_eq!(params.initial_mastery, 0.1);
/// assert_eq!(params.slip, 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BktParams {
    pub initial_mastery: f64,
    pub learn: f64,
    pub guess: f64,
    pub slip: f64,
}

impl BktParams {
    pub const DEFAULT_INITIAL_MASTERY: f64 = 0.1;
    pub const DEFAULT_LEARN: f64 = 0.3;
    pub const DEFAULT_GUESS: f64 = 0.2;
    pub const DEFAULT_SLIP: f64 = 0.1;

    fn validate(&self) -> Result<(), BktError> {
        let fields = [
            ("initial_mastery", self.initial_mastery),
            ("learn", self.learn),
            ("guess", self.guess),
            ("slip", self.slip),
        ];
        for (name, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(BktError::InvalidProbability {
                    name,
                    provided: value,
                });
            }
        }
        Ok(())
    }
}

impl Default for BktParams {
    fn default() -> Self {
        Self {
            initial_mastery: Self::DEFAULT_INITIAL_MASTERY,
            learn: Self::DEFAULT_LEARN,
            guess: Self::DEFAULT_GUESS,
            slip: Self::DEFAULT_SLIP,
        }
    }
}

//
// ─── ESTIMATOR ─────────────────────────────────────────────────────────────────
//

/// Posterior mastery estimator for a single topic.
///
/// Each graded attempt is folded in with Bayes' rule, then the learning
/// transition is applied. An incorrect attempt only applies half of the
/// transition probability.
///
/// # Examples
///
/// ```
/// # use tutor_core::bkt::BktEstimator;
/// let bkt = BktEstimator::new();
/// let after = bkt.update(0.1, true);
/// assert!((after - 0.5333).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BktEstimator {
    params: BktParams,
}

impl BktEstimator {
    /// Estimator with the standard tutoring parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimator with custom parameters.
    ///
    /// # Errors
    ///
    /// Returns `BktError::InvalidProbability` if any parameter falls outside `[0, 1]`
    /// or is not a number.
    pub fn try_with_params(params: BktParams) -> Result<Self, BktError> {
        params.validate()?;
        Ok(Self { params })
    }

    #[must_use]
    pub fn params(&self) -> &BktParams {
        &self.params
    }

    /// Mastery assigned to a topic before any attempt.
    #[must_use]
    pub fn initial_mastery(&self) -> f64 {
        self.params.initial_mastery
    }

    /// Computes the posterior mastery after one graded attempt.
    ///
    /// Out-of-range priors are clamped to `[0, 1]` first and a NaN prior is
    /// treated as the initial mastery. The result is always within `[0, 1]`.
    #[must_use]
    pub fn update(&self, prior: f64, was_correct: bool) -> f64 {
        let prior = if prior.is_nan() {
            self.params.initial_mastery
        } else {
            prior.clamp(0.0, 1.0)
        };
        let BktParams {
            learn, guess, slip, ..
        } = self.params;

        let (posterior, transition) = if was_correct {
            (
                bayes(prior * (1.0 - slip), (1.0 - prior) * guess, prior),
                learn,
            )
        } else {
            (
                bayes(prior * slip, (1.0 - prior) * (1.0 - guess), prior),
                learn / 2.0,
            )
        };

        (posterior + (1.0 - posterior) * transition).clamp(0.0, 1.0)
    }
}

/// `mastered / (mastered + unmastered)`; falls back to `prior` on a zero denominator.
fn bayes(mastered: f64, unmastered: f64, prior: f64) -> f64 {
    let denominator = mastered + unmastered;
    if denominator == 0.0 {
        prior
    } else {
        mastered / denominator
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

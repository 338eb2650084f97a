//! The cost function contract.

use crate::error::EvaluationError;

/// Maps a solution value to a cost. Lower is better.
///
/// Evaluators must be callable from several worker threads at once; the
/// engine performs no synchronization around them.
///
/// Any `Fn(&E) -> f64 + Send + Sync` is an evaluator that never fails:
///
/// ```
/// use u_stochopt::Evaluator;
///
/// fn sphere(x: &Vec<f64>) -> f64 {
///     x.iter().map(|v| v * v).sum()
/// }
///
/// assert_eq!(sphere.evaluate(&vec![1.0, 2.0]), Ok(5.0));
/// ```
pub trait Evaluator<E: ?Sized>: Send + Sync {
    fn evaluate(&self, value: &E) -> Result<f64, EvaluationError>;
}

impl<E: ?Sized, F> Evaluator<E> for F
where
    F: Fn(&E) -> f64 + Send + Sync,
{
    fn evaluate(&self, value: &E) -> Result<f64, EvaluationError> {
        Ok(self(value))
    }
}

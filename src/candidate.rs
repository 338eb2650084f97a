//! Candidates and populations.
//!
//! A [`Candidate`] pairs a solution value with its evaluated cost. A
//! [`Population`] is an ordered, fixed-capacity collection of candidates.

use crate::error::{OptError, OptResult};
use crate::evaluator::Evaluator;
use std::cmp::Ordering;

/// A solution value and its cost.
///
/// The cost always belongs to the stored value: [`value_mut`](Self::value_mut)
/// marks the candidate as needing evaluation, and
/// [`reevaluate`](Self::reevaluate) restores the invariant.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate<E> {
    value: E,
    cost: f64,
    evaluated: bool,
}

impl<E> Candidate<E> {
    /// Wraps a value with an already known cost.
    pub fn new(value: E, cost: f64) -> Self {
        Self {
            value,
            cost,
            evaluated: true,
        }
    }

    /// Wraps a value that has not been evaluated yet. Its cost reads as
    /// `f64::INFINITY` until evaluated.
    pub fn unevaluated(value: E) -> Self {
        Self {
            value,
            cost: f64::INFINITY,
            evaluated: false,
        }
    }

    /// Evaluates `value` and wraps it.
    pub fn evaluated<V: Evaluator<E> + ?Sized>(value: E, evaluator: &V) -> OptResult<Self> {
        let cost = evaluator.evaluate(&value)?;
        Ok(Self::new(value, cost))
    }

    pub fn value(&self) -> &E {
        &self.value
    }

    /// Mutable access to the value. The candidate must be re-evaluated
    /// before its cost is trusted again.
    pub fn value_mut(&mut self) -> &mut E {
        self.evaluated = false;
        &mut self.value
    }

    pub fn into_value(self) -> E {
        self.value
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Whether the cost reflects the current value.
    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    /// Recomputes the cost of the current value.
    pub fn reevaluate<V: Evaluator<E> + ?Sized>(&mut self, evaluator: &V) -> OptResult<()> {
        self.cost = evaluator.evaluate(&self.value)?;
        self.evaluated = true;
        Ok(())
    }

    /// Orders by cost ascending. NaN costs sort after every number.
    pub fn cmp_cost(&self, other: &Self) -> Ordering {
        cmp_cost(self.cost, other.cost)
    }
}

/// Total order on costs with NaN last.
pub(crate) fn cmp_cost(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.total_cmp(&b),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
}

/// An ordered collection of candidates with a fixed logical capacity.
///
/// Slot positions are stable between calls, which DE and PSO rely on for
/// in-place replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct Population<E> {
    candidates: Vec<Candidate<E>>,
    capacity: usize,
}

impl<E: Clone> Population<E> {
    /// Creates an empty population holding at most `capacity` candidates.
    pub fn new(capacity: usize) -> Self {
        Self {
            candidates: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Builds a population from existing candidates.
    pub fn from_candidates(candidates: Vec<Candidate<E>>, capacity: usize) -> OptResult<Self> {
        let mut population = Self::new(capacity);
        population.replace_all(candidates)?;
        Ok(population)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.candidates.len() >= self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&Candidate<E>> {
        self.candidates.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate<E>> {
        self.candidates.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Candidate<E>> {
        self.candidates.iter_mut()
    }

    pub fn as_slice(&self) -> &[Candidate<E>] {
        &self.candidates
    }

    pub fn as_mut_slice(&mut self) -> &mut [Candidate<E>] {
        &mut self.candidates
    }

    pub fn into_vec(self) -> Vec<Candidate<E>> {
        self.candidates
    }

    /// Appends a candidate. Fails when the population is full.
    pub fn push(&mut self, candidate: Candidate<E>) -> OptResult<()> {
        if self.is_full() {
            return Err(OptError::invalid_argument(format!(
                "population is full ({} candidates)",
                self.capacity
            )));
        }
        self.candidates.push(candidate);
        Ok(())
    }

    /// Replaces the candidate in slot `index`, returning the previous one.
    pub fn set(&mut self, index: usize, candidate: Candidate<E>) -> OptResult<Candidate<E>> {
        let len = self.candidates.len();
        let slot = self.candidates.get_mut(index).ok_or_else(|| {
            OptError::invalid_argument(format!("slot {index} out of range for {len} candidates"))
        })?;
        Ok(std::mem::replace(slot, candidate))
    }

    /// Stable sort by cost, best first.
    pub fn sort_by_cost(&mut self) {
        self.candidates.sort_by(Candidate::cmp_cost);
    }

    /// Arithmetic mean of all costs. `NaN` for an empty population.
    pub fn mean_cost(&self) -> f64 {
        let total: f64 = self.candidates.iter().map(Candidate::cost).sum();
        total / self.candidates.len() as f64
    }

    /// The lowest-cost candidate.
    pub fn best(&self) -> Option<&Candidate<E>> {
        self.candidates.iter().min_by(|a, b| a.cmp_cost(b))
    }

    /// Clones of the `num_best` lowest-cost candidates, best first.
    ///
    /// # Errors
    /// [`OptError::InvalidArgument`] when `num_best` is zero or exceeds the
    /// number of candidates.
    pub fn best_candidates(&self, num_best: usize) -> OptResult<Vec<Candidate<E>>> {
        if num_best == 0 {
            return Err(OptError::invalid_argument(
                "the number of best candidates must be positive",
            ));
        }
        if num_best > self.candidates.len() {
            return Err(OptError::invalid_argument(format!(
                "requested {num_best} best candidates, only {} available",
                self.candidates.len()
            )));
        }
        let mut sorted = self.candidates.clone();
        sorted.sort_by(Candidate::cmp_cost);
        sorted.truncate(num_best);
        Ok(sorted)
    }

    /// Clears the population and inserts `candidates`.
    ///
    /// # Errors
    /// [`OptError::InvalidArgument`] if more than `capacity` candidates are
    /// supplied; the population is left untouched.
    pub fn replace_all(&mut self, candidates: Vec<Candidate<E>>) -> OptResult<()> {
        if candidates.len() > self.capacity {
            return Err(OptError::invalid_argument(format!(
                "{} candidates exceed the population capacity of {}",
                candidates.len(),
                self.capacity
            )));
        }
        self.candidates = candidates;
        Ok(())
    }
}

impl<'a, E> IntoIterator for &'a Population<E> {
    type Item = &'a Candidate<E>;
    type IntoIter = std::slice::Iter<'a, Candidate<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_population(costs: &[f64]) -> Population<usize> {
        let candidates = costs
            .iter()
            .enumerate()
            .map(|(i, &c)| Candidate::new(i, c))
            .collect();
        Population::from_candidates(candidates, costs.len()).expect("fits capacity")
    }

    #[test]
    fn test_sort_is_stable() {
        let mut pop = make_population(&[3.0, 1.0, 2.0, 1.0]);
        pop.sort_by_cost();
        let order: Vec<usize> = pop.iter().map(|c| *c.value()).collect();
        assert_eq!(order, vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_nan_sorts_last() {
        let mut pop = make_population(&[f64::NAN, 1.0, -2.0]);
        pop.sort_by_cost();
        assert_eq!(*pop.get(0).map(Candidate::value).unwrap(), 2);
        assert!(pop.get(2).unwrap().cost().is_nan());
    }

    #[test]
    fn test_mean_cost() {
        let pop = make_population(&[1.0, 2.0, 3.0, 6.0]);
        assert!((pop.mean_cost() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_best_candidates() {
        let pop = make_population(&[5.0, 1.0, 4.0, 2.0]);
        let best = pop.best_candidates(2).unwrap();
        let costs: Vec<f64> = best.iter().map(Candidate::cost).collect();
        assert_eq!(costs, vec![1.0, 2.0]);
        // the population itself is not reordered
        assert_eq!(pop.get(0).unwrap().cost(), 5.0);
    }

    #[test]
    fn test_best_candidates_out_of_range() {
        let pop = make_population(&[5.0, 1.0]);
        assert!(matches!(
            pop.best_candidates(3),
            Err(OptError::InvalidArgument(_))
        ));
        assert!(matches!(
            pop.best_candidates(0),
            Err(OptError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_replace_all_over_capacity_leaves_population() {
        let mut pop = make_population(&[1.0, 2.0]);
        let too_many = vec![Candidate::new(9, 0.0); 3];
        assert!(pop.replace_all(too_many).is_err());
        assert_eq!(pop.len(), 2);
        assert_eq!(pop.get(1).unwrap().cost(), 2.0);
    }

    #[test]
    fn test_push_respects_capacity() {
        let mut pop: Population<usize> = Population::new(1);
        pop.push(Candidate::new(0, 1.0)).unwrap();
        assert!(pop.is_full());
        assert!(pop.push(Candidate::new(1, 1.0)).is_err());
    }

    #[test]
    fn test_set_slot() {
        let mut pop = make_population(&[1.0, 2.0]);
        let old = pop.set(1, Candidate::new(7, 0.5)).unwrap();
        assert_eq!(*old.value(), 1);
        assert_eq!(pop.best().unwrap().cost(), 0.5);
        assert!(pop.set(5, Candidate::new(8, 0.0)).is_err());
    }

    #[test]
    fn test_value_mut_requires_reevaluation() {
        let sum = |x: &Vec<f64>| -> f64 { x.iter().sum() };
        let mut c = Candidate::evaluated(vec![1.0, 2.0], &sum).unwrap();
        assert!(c.is_evaluated());
        c.value_mut()[0] = 10.0;
        assert!(!c.is_evaluated());
        c.reevaluate(&sum).unwrap();
        assert!(c.is_evaluated());
        assert_eq!(c.cost(), 12.0);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = Candidate::new(vec![1.0], 1.0);
        let b = a.clone();
        a.value_mut()[0] = 2.0;
        assert_eq!(b.value()[0], 1.0);
    }

    proptest! {
        #[test]
        fn prop_sorted_population_is_ascending(
            costs in prop::collection::vec(-1e6f64..1e6, 1..50),
        ) {
            let mut pop = make_population(&costs);
            pop.sort_by_cost();
            for w in pop.as_slice().windows(2) {
                prop_assert!(w[0].cost() <= w[1].cost());
            }
            prop_assert_eq!(pop.len(), costs.len());
        }

        #[test]
        fn prop_best_candidates_are_minimal(
            costs in prop::collection::vec(-1e6f64..1e6, 1..50),
            k in 1usize..50,
        ) {
            let pop = make_population(&costs);
            let k = k.min(costs.len());
            let best = pop.best_candidates(k).unwrap();
            let threshold = best.last().unwrap().cost();
            let below = costs.iter().filter(|&&c| c < threshold).count();
            prop_assert!(below < k);
            prop_assert_eq!(best.len(), k);
        }
    }
}

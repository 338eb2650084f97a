//! The global best candidate, shared between worker tasks.

use crate::candidate::Candidate;
use crate::error::OptResult;
use std::sync::Mutex;

/// Holds a clone of the best candidate observed so far.
///
/// Every comparison-then-update runs inside one critical section, so
/// concurrent [`offer`](Self::offer) calls never lose an improvement.
#[derive(Debug)]
pub struct Incumbent<E> {
    best: Mutex<Candidate<E>>,
}

impl<E: Clone> Incumbent<E> {
    pub fn new(initial: Candidate<E>) -> Self {
        Self {
            best: Mutex::new(initial),
        }
    }

    /// Replaces the incumbent with a clone of `candidate` if it is strictly
    /// better. Returns whether the incumbent changed.
    pub fn offer(&self, candidate: &Candidate<E>) -> OptResult<bool> {
        let mut best = self.best.lock()?;
        if candidate.cost() < best.cost() {
            *best = candidate.clone();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// A clone of the current incumbent.
    pub fn snapshot(&self) -> OptResult<Candidate<E>> {
        Ok(self.best.lock()?.clone())
    }

    /// A clone of the current incumbent, read through a poisoned lock.
    ///
    /// Writers only ever store a complete candidate, so the value is still
    /// the best seen even after a holder panicked.
    pub fn peek(&self) -> Candidate<E> {
        let best = self.best.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("incumbent lock poisoned, reading the stored candidate");
            poisoned.into_inner()
        });
        best.clone()
    }

    pub fn cost(&self) -> OptResult<f64> {
        Ok(self.best.lock()?.cost())
    }

    pub fn into_inner(self) -> OptResult<Candidate<E>> {
        Ok(self.best.into_inner()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_offer_only_accepts_improvements() {
        let inc = Incumbent::new(Candidate::new(0u32, 5.0));
        assert!(!inc.offer(&Candidate::new(1, 6.0)).unwrap());
        assert!(!inc.offer(&Candidate::new(2, 5.0)).unwrap());
        assert!(inc.offer(&Candidate::new(3, 4.0)).unwrap());
        assert_eq!(*inc.snapshot().unwrap().value(), 3);
    }

    #[test]
    fn test_peek_survives_poisoned_lock() {
        let inc = Incumbent::new(Candidate::new(7u32, 2.0));
        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = inc.best.lock().unwrap();
            panic!("holder died");
        }));
        assert!(poisoned.is_err());

        assert!(inc.snapshot().is_err());
        let best = inc.peek();
        assert_eq!(*best.value(), 7);
        assert_eq!(best.cost(), 2.0);
    }

    #[test]
    fn test_concurrent_offers_keep_minimum() {
        let inc = Incumbent::new(Candidate::new(usize::MAX, f64::INFINITY));
        (0..10_000usize).into_par_iter().for_each(|i| {
            let cost = ((i * 7919) % 10_007) as f64;
            inc.offer(&Candidate::new(i, cost)).unwrap();
        });
        let best = inc.into_inner().unwrap();
        assert_eq!(best.cost(), 0.0);
        assert_eq!(*best.value(), 0);
    }
}

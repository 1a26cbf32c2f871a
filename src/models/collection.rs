//! Concurrency-safe ordered transaction container
//!
//! Backed by an append-only `Vec` behind an `RwLock`. Readers take a snapshot
//! (a cheap clone of `Arc` handles) and never hold the lock while running
//! caller code.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::FinanceResult;

use super::transaction::Transaction;

/// A function applied to every element by [`TransactionCollection::range`]
pub type RangeFn<'a> = &'a dyn Fn(&Transaction) -> FinanceResult<()>;

/// An ordered collection of transactions
#[derive(Debug, Default)]
pub struct TransactionCollection {
    transactions: RwLock<Vec<Arc<Transaction>>>,
}

impl TransactionCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the Vec half-appended, so a
    // poisoned lock still guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Transaction>>> {
        self.transactions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<Transaction>>> {
        self.transactions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append transactions in order
    pub fn add<I>(&self, transactions: I) -> &Self
    where
        I: IntoIterator<Item = Transaction>,
    {
        let incoming: Vec<Arc<Transaction>> = transactions.into_iter().map(Arc::new).collect();
        if !incoming.is_empty() {
            self.write().extend(incoming);
        }
        self
    }

    /// Append a single transaction
    pub fn push(&self, transaction: Transaction) -> &Self {
        self.write().push(Arc::new(transaction));
        self
    }

    /// Snapshot of the current contents in insertion order
    pub fn all(&self) -> Vec<Arc<Transaction>> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// New collection holding the elements for which `include` is true
    pub fn subset<F>(&self, include: F) -> TransactionCollection
    where
        F: Fn(&Transaction) -> bool,
    {
        let kept: Vec<Arc<Transaction>> = self
            .all()
            .into_iter()
            .filter(|t| include(t))
            .collect();
        TransactionCollection {
            transactions: RwLock::new(kept),
        }
    }

    /// Run every function over every element.
    ///
    /// Without a sink the first failure is returned and iteration stops. With
    /// a sink every failure is forwarded to it and iteration continues.
    pub fn range(
        &self,
        mut sink: Option<&mut dyn FnMut(crate::error::FinanceError)>,
        fns: &[RangeFn<'_>],
    ) -> FinanceResult<()> {
        if fns.is_empty() {
            return Ok(());
        }
        for transaction in self.all() {
            for f in fns {
                if let Err(err) = f(&transaction) {
                    match sink.as_mut() {
                        Some(sink) => sink(err),
                        None => return Err(err),
                    }
                }
            }
        }
        Ok(())
    }

    /// Total amount over all elements, zero when empty. Wraps on overflow.
    pub fn sum(&self) -> i64 {
        self.read()
            .iter()
            .fold(0i64, |acc, t| acc.wrapping_add(t.amount))
    }
}

impl Clone for TransactionCollection {
    fn clone(&self) -> Self {
        Self {
            transactions: RwLock::new(self.all()),
        }
    }
}

impl FromIterator<Transaction> for TransactionCollection {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        let collection = Self::new();
        collection.add(iter);
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, FinanceError};
    use std::cell::Cell;
    use std::thread;

    fn amounts(amounts: &[i64]) -> TransactionCollection {
        amounts
            .iter()
            .enumerate()
            .map(|(i, a)| Transaction::new(format!("t{}", i), *a))
            .collect()
    }

    #[test]
    fn test_sum() {
        let c = amounts(&[100, 1, -5, 201, -200]);
        assert_eq!(c.sum(), 97);
    }

    #[test]
    fn test_sum_wraps_instead_of_panicking() {
        let c = amounts(&[i64::MAX, 1]);
        assert_eq!(c.sum(), i64::MIN);

        let c = amounts(&[i64::MIN, -1]);
        assert_eq!(c.sum(), i64::MAX);
    }

    #[test]
    fn test_empty_sum_is_zero() {
        assert_eq!(TransactionCollection::new().sum(), 0);
    }

    #[test]
    fn test_insertion_order() {
        let c = TransactionCollection::new();
        c.push(Transaction::new("first", 1));
        c.add(vec![Transaction::new("second", 2), Transaction::new("third", 3)]);
        let labels: Vec<_> = c.all().iter().map(|t| t.label.clone()).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_snapshot_not_mutated_by_later_add() {
        let c = amounts(&[1, 2]);
        let snapshot = c.all();
        c.push(Transaction::new("late", 3));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_subset_partitions() {
        let c = amounts(&[10, -3, 0, 7, -1]);
        let incoming = c.subset(|t| t.amount > 0);
        let rest = c.subset(|t| !(t.amount > 0));
        assert_eq!(incoming.len() + rest.len(), c.len());
        assert_eq!(incoming.sum(), 17);
        assert_eq!(rest.sum(), -4);
        let labels: Vec<_> = incoming.all().iter().map(|t| t.label.clone()).collect();
        assert_eq!(labels, vec!["t0", "t3"]);
    }

    #[test]
    fn test_range_fail_fast() {
        let c = amounts(&[1, 2, 3]);
        let calls = Cell::new(0);
        let count = |_: &Transaction| -> FinanceResult<()> {
            calls.set(calls.get() + 1);
            Err(FinanceError::Unknown("stop".into()))
        };
        let err = c.range(None, &[&count]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_range_collects_all_errors() {
        let c = amounts(&[1, -2, 3, -4]);
        let reject_outflow = |t: &Transaction| -> FinanceResult<()> {
            if t.is_outflow() {
                Err(FinanceError::InvalidAmount(t.label.clone()))
            } else {
                Ok(())
            }
        };
        let seen = Cell::new(0);
        let visit = |_: &Transaction| -> FinanceResult<()> {
            seen.set(seen.get() + 1);
            Ok(())
        };
        let mut errors = Vec::new();
        let mut sink = |e: FinanceError| errors.push(e);
        c.range(Some(&mut sink), &[&reject_outflow, &visit]).unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(seen.get(), 4);
    }

    #[test]
    fn test_concurrent_adds_lose_nothing() {
        let c = Arc::new(TransactionCollection::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let c = Arc::clone(&c);
                thread::spawn(move || {
                    for i in 0..250 {
                        c.push(Transaction::new(format!("w{}-{}", worker, i), worker + 1));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.len(), 2000);
        assert_eq!(c.sum(), (1..=8).map(|w| w * 250).sum::<i64>());
    }
}

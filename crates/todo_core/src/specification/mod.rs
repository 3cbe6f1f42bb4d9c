//! Composable, side-effect-free predicates.
//!
//! # Responsibility
//! - Provide the `Specification` contract and its AND/OR/NOT combinators.
//! - Let repositories filter candidates without knowing the predicate shape.
//!
//! # Invariants
//! - `is_satisfied_by` is pure: no I/O, no mutation of the candidate.
//! - Combinators take ownership of their operands and build new values.
//! - `and`/`or` evaluate left operand first and short-circuit.
//! - Grouping follows call nesting only; there is no implicit precedence.

pub mod todo;

use std::marker::PhantomData;

/// Predicate over candidates of type `T`.
pub trait Specification<T>: Send + Sync {
    fn is_satisfied_by(&self, candidate: &T) -> bool;

    /// Both `self` and `other` must hold.
    fn and<S>(self, other: S) -> AndSpecification<Self, S>
    where
        Self: Sized,
        S: Specification<T>,
    {
        AndSpecification {
            left: self,
            right: other,
        }
    }

    /// Either `self` or `other` must hold.
    fn or<S>(self, other: S) -> OrSpecification<Self, S>
    where
        Self: Sized,
        S: Specification<T>,
    {
        OrSpecification {
            left: self,
            right: other,
        }
    }

    /// Negates `self`.
    fn not(self) -> NotSpecification<Self>
    where
        Self: Sized,
    {
        NotSpecification { inner: self }
    }

    /// Erases the concrete type, e.g. to build predicates at runtime.
    fn boxed(self) -> BoxedSpecification<T>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// Type-erased specification.
pub type BoxedSpecification<T> = Box<dyn Specification<T>>;

impl<T, S> Specification<T> for Box<S>
where
    S: Specification<T> + ?Sized,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (**self).is_satisfied_by(candidate)
    }
}

impl<T, S> Specification<T> for &S
where
    S: Specification<T> + ?Sized,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (**self).is_satisfied_by(candidate)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AndSpecification<L, R> {
    left: L,
    right: R,
}

impl<T, L, R> Specification<T> for AndSpecification<L, R>
where
    L: Specification<T>,
    R: Specification<T>,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) && self.right.is_satisfied_by(candidate)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrSpecification<L, R> {
    left: L,
    right: R,
}

impl<T, L, R> Specification<T> for OrSpecification<L, R>
where
    L: Specification<T>,
    R: Specification<T>,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) || self.right.is_satisfied_by(candidate)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NotSpecification<S> {
    inner: S,
}

impl<T, S> Specification<T> for NotSpecification<S>
where
    S: Specification<T>,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        !self.inner.is_satisfied_by(candidate)
    }
}

/// Leaf specification backed by a closure.
pub struct PredicateSpecification<T, F> {
    predicate: F,
    _candidate: PhantomData<fn(&T) -> bool>,
}

impl<T, F> Specification<T> for PredicateSpecification<T, F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (self.predicate)(candidate)
    }
}

/// Wraps a pure closure as a leaf specification.
pub fn predicate<T, F>(predicate: F) -> PredicateSpecification<T, F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    PredicateSpecification {
        predicate,
        _candidate: PhantomData,
    }
}

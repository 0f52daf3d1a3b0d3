//! Materialized, composable views over deserialized documents.

use std::cmp::Ordering;

use crate::page::{Page, PaginationParams};

/// A fully materialized sequence of deserialized documents.
///
/// Every combinator consumes the view and returns a new one, so queries read
/// as a pipeline. Nothing is pushed down to the container: the documents were
/// all decoded before the first combinator runs.
///
/// # Example
///
/// ```ignore
/// let names: Vec<String> = container
///     .build_queryable::<User>()?
///     .filter(|user| user.age >= 18)
///     .sort_by_key(|user| user.name.clone())
///     .select(|user| user.name)
///     .take(10)
///     .into_vec();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Queryable<T> {
    items: Vec<T>,
}

impl<T> Queryable<T> {
    /// Wraps an already materialized set of items.
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Keeps only the items matching `predicate`.
    pub fn filter<P>(mut self, mut predicate: P) -> Self
    where
        P: FnMut(&T) -> bool,
    {
        self.items.retain(|item| predicate(item));
        self
    }

    /// Sorts the items with a comparator. The sort is stable.
    pub fn sort_by<F>(mut self, compare: F) -> Self
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.items.sort_by(compare);
        self
    }

    /// Sorts the items by an extracted key. The sort is stable.
    pub fn sort_by_key<K, F>(mut self, key: F) -> Self
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.items.sort_by_key(key);
        self
    }

    /// Projects each item into a new shape.
    pub fn select<U, F>(self, projection: F) -> Queryable<U>
    where
        F: FnMut(T) -> U,
    {
        Queryable::new(self.items.into_iter().map(projection).collect())
    }

    /// Drops the first `count` items.
    pub fn skip(mut self, count: usize) -> Self {
        let count = count.min(self.items.len());
        self.items.drain(..count);
        self
    }

    /// Keeps at most `count` items.
    pub fn take(mut self, count: usize) -> Self {
        self.items.truncate(count);
        self
    }

    /// Returns the first item, if any.
    pub fn first(self) -> Option<T> {
        self.items.into_iter().next()
    }

    /// Number of items in the view.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the view holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the items by reference.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Returns a single page of the current items.
    pub fn paginate(self, params: &PaginationParams) -> Page<T> {
        params.paginate(self.items)
    }

    /// Unwraps the view into its items.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for Queryable<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> IntoIterator for Queryable<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Queryable<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> FromIterator<T> for Queryable<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

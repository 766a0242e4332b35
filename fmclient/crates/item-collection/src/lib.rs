//! Ordered result collections paired with a server-reported total count.
//!
//! A find request may return only one page of matches. [`ItemCollection`]
//! keeps the items that were actually fetched together with the total number
//! of matches the server reported for the whole request, so callers can page
//! without issuing a separate count query.

use serde::Serialize;

/// Items fetched by one request plus the total number of matches.
///
/// ## Invariants
/// - Item order is the order in which the server returned them.
/// - `total_count` is independent of `len()`; it may be larger when a limit
///   or offset was applied.
///
/// # Examples
/// ```
/// use item_collection::ItemCollection;
///
/// let collection = ItemCollection::new(vec!["a", "b"], 10);
/// assert_eq!(collection.len(), 2);
/// assert_eq!(collection.total_count(), 10);
/// assert_eq!(collection.first(), Some(&"a"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCollection<T> {
    items: Vec<T>,
    total_count: usize,
}

impl<T> ItemCollection<T> {
    /// Build a collection from fetched items and the reported total count.
    #[must_use]
    pub const fn new(items: Vec<T>, total_count: usize) -> Self {
        Self { items, total_count }
    }

    /// A collection with no items and a total count of zero.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    /// Total number of matches reported by the server.
    #[must_use]
    pub const fn total_count(&self) -> usize {
        self.total_count
    }

    /// Number of items actually fetched.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no items were fetched.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First fetched item, if any.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Iterate over the fetched items.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Borrow the fetched items as a slice.
    #[must_use]
    pub const fn as_slice(&self) -> &[T] {
        self.items.as_slice()
    }

    /// Consume the collection, returning the fetched items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Take ownership of the first item, discarding the rest.
    #[must_use]
    pub fn into_first(self) -> Option<T> {
        self.items.into_iter().next()
    }

    /// Map every item, keeping the total count.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`; later items are not visited.
    pub fn try_map<U, E, F>(self, f: F) -> Result<ItemCollection<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        let total_count = self.total_count;
        let items = self.items.into_iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(ItemCollection::new(items, total_count))
    }
}

impl<T> Default for ItemCollection<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> IntoIterator for ItemCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ItemCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn empty_collection_reports_zero_total() {
        let collection = ItemCollection::<u32>::empty();
        assert!(collection.is_empty());
        assert_eq!(collection.total_count(), 0);
        assert!(collection.first().is_none());
    }

    #[rstest]
    #[case(vec![1, 2, 3], 3)]
    #[case(vec![1], 50)]
    fn total_count_is_independent_of_fetched_items(
        #[case] items: Vec<u32>,
        #[case] total_count: usize,
    ) {
        let fetched = items.len();
        let collection = ItemCollection::new(items, total_count);
        assert_eq!(collection.len(), fetched);
        assert_eq!(collection.total_count(), total_count);
    }

    #[rstest]
    fn try_map_keeps_total_count() {
        let collection = ItemCollection::new(vec!["1", "2"], 7);
        let mapped = collection
            .try_map(|value| value.parse::<u32>())
            .expect("numbers parse");
        assert_eq!(mapped.as_slice(), &[1, 2]);
        assert_eq!(mapped.total_count(), 7);
    }

    #[rstest]
    fn try_map_stops_at_first_error() {
        let collection = ItemCollection::new(vec!["1", "x", "3"], 3);
        assert!(collection.try_map(|value| value.parse::<u32>()).is_err());
    }

    #[rstest]
    fn serialises_with_camel_case_total() {
        let collection = ItemCollection::new(vec![1], 4);
        let json = serde_json::to_value(&collection).expect("serialises");
        assert_eq!(json, serde_json::json!({ "items": [1], "totalCount": 4 }));
    }
}

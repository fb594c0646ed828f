use std::hash::Hash;
use std::ops::Index;

use indexmap::IndexMap;
use serde::Serialize;

/// Page description shared by every paged collection shape
///
/// # Example
/// ```
/// use data_access_db::pagination::PageMetadata;
///
/// let metadata = PageMetadata {
///     page_number: 0,
///     page_size: 20,
///     total_count: 200,
///     total_pages: 10,
/// };
///
/// assert!(!metadata.has_previous_page());
/// assert!(metadata.has_next_page());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    /// Zero-based index of the page
    pub page_number: usize,
    /// Maximum number of items per page
    pub page_size: usize,
    /// Total number of items across all pages
    pub total_count: usize,
    /// Total number of pages, at least one
    pub total_pages: usize,
}

impl PageMetadata {
    pub fn has_previous_page(&self) -> bool {
        self.page_number > 0
    }

    pub fn has_next_page(&self) -> bool {
        self.page_number + 1 < self.total_pages
    }
}

/// Read-only page of items plus its metadata.
///
/// Implementations are only built by the pagination extensions, after the
/// inputs were validated and the page was found in range.
pub trait PagedCollection {
    type Item;

    fn metadata(&self) -> &PageMetadata;

    /// Number of items in this page
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn page_number(&self) -> usize {
        self.metadata().page_number
    }

    fn page_size(&self) -> usize {
        self.metadata().page_size
    }

    fn total_count(&self) -> usize {
        self.metadata().total_count
    }

    fn total_pages(&self) -> usize {
        self.metadata().total_pages
    }

    fn has_previous_page(&self) -> bool {
        self.metadata().has_previous_page()
    }

    fn has_next_page(&self) -> bool {
        self.metadata().has_next_page()
    }
}

/// Paged array of `T`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagedArray<T> {
    #[serde(flatten)]
    metadata: PageMetadata,
    items: Box<[T]>,
}

impl<T> PagedArray<T> {
    pub(crate) fn new(metadata: PageMetadata, items: Box<[T]>) -> Self {
        Self { metadata, items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn into_items(self) -> Box<[T]> {
        self.items
    }
}

impl<T> PagedCollection for PagedArray<T> {
    type Item = T;

    fn metadata(&self) -> &PageMetadata {
        &self.metadata
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Index<usize> for PagedArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a PagedArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Paged list of `T`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagedList<T> {
    #[serde(flatten)]
    metadata: PageMetadata,
    items: Vec<T>,
}

impl<T> PagedList<T> {
    pub(crate) fn new(metadata: PageMetadata, items: Vec<T>) -> Self {
        Self { metadata, items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> PagedCollection for PagedList<T> {
    type Item = T;

    fn metadata(&self) -> &PageMetadata {
        &self.metadata
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Index<usize> for PagedList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a PagedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Paged dictionary of `V` keyed by the output of a key selector.
///
/// Entries keep the order in which the source returned them, so
/// [`PagedDictionary::get_index`] agrees with the positional order of the
/// equivalent [`PagedList`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagedDictionary<K: Hash + Eq, V> {
    #[serde(flatten)]
    metadata: PageMetadata,
    items: IndexMap<K, V>,
}

impl<K: Hash + Eq, V> PagedDictionary<K, V> {
    pub(crate) fn new(metadata: PageMetadata, items: IndexMap<K, V>) -> Self {
        Self { metadata, items }
    }

    pub fn items(&self) -> &IndexMap<K, V> {
        &self.items
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.items.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.items.contains_key(key)
    }

    /// Entry at `index` in source order
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.items.get_index(index)
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, K, V> {
        self.items.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, K, V> {
        self.items.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.items.iter()
    }

    pub fn into_items(self) -> IndexMap<K, V> {
        self.items
    }
}

impl<K: Hash + Eq, V> PagedCollection for PagedDictionary<K, V> {
    type Item = V;

    fn metadata(&self) -> &PageMetadata {
        &self.metadata
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

impl<K: Hash + Eq, V> Index<&K> for PagedDictionary<K, V> {
    type Output = V;

    fn index(&self, key: &K) -> &V {
        &self.items[key]
    }
}

impl<'a, K: Hash + Eq, V> IntoIterator for &'a PagedDictionary<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

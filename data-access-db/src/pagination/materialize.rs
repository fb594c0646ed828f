use std::hash::Hash;

use data_access_api::PaginationError;
use indexmap::map::Entry;
use indexmap::IndexMap;

use super::paged_collection::{PageMetadata, PagedArray, PagedDictionary, PagedList};

/// Turns the rows fetched for one page into a paged collection shape.
pub trait Materialize<T> {
    type Output;

    fn materialize(
        self,
        metadata: PageMetadata,
        rows: Vec<T>,
    ) -> Result<Self::Output, PaginationError>;
}

/// Materializes a page into a [`PagedArray`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayShape;

/// Materializes a page into a [`PagedList`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ListShape;

/// Materializes a page into a [`PagedDictionary`] keyed by the wrapped selector.
///
/// Keys must be unique within the page. The first repeated key aborts the
/// materialization with [`PaginationError::DuplicateKey`].
#[derive(Debug, Clone, Copy)]
pub struct DictionaryShape<F>(pub F);

impl<T> Materialize<T> for ArrayShape {
    type Output = PagedArray<T>;

    fn materialize(
        self,
        metadata: PageMetadata,
        rows: Vec<T>,
    ) -> Result<Self::Output, PaginationError> {
        Ok(PagedArray::new(metadata, rows.into_boxed_slice()))
    }
}

impl<T> Materialize<T> for ListShape {
    type Output = PagedList<T>;

    fn materialize(
        self,
        metadata: PageMetadata,
        rows: Vec<T>,
    ) -> Result<Self::Output, PaginationError> {
        Ok(PagedList::new(metadata, rows))
    }
}

impl<T, K, F> Materialize<T> for DictionaryShape<F>
where
    F: Fn(&T) -> K,
    K: Hash + Eq,
{
    type Output = PagedDictionary<K, T>;

    fn materialize(
        self,
        metadata: PageMetadata,
        rows: Vec<T>,
    ) -> Result<Self::Output, PaginationError> {
        let key_selector = self.0;
        let mut items = IndexMap::with_capacity(rows.len());
        for (position, row) in rows.into_iter().enumerate() {
            match items.entry(key_selector(&row)) {
                Entry::Occupied(_) => {
                    return Err(PaginationError::DuplicateKey {
                        page_number: metadata.page_number,
                        position,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(row);
                }
            }
        }
        Ok(PagedDictionary::new(metadata, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::paged_collection::PagedCollection;

    fn metadata() -> PageMetadata {
        PageMetadata {
            page_number: 1,
            page_size: 3,
            total_count: 6,
            total_pages: 2,
        }
    }

    #[test]
    fn test_array_and_list_keep_order() {
        let array = ArrayShape.materialize(metadata(), vec![3, 1, 2]).unwrap();
        let list = ListShape.materialize(metadata(), vec![3, 1, 2]).unwrap();
        assert_eq!(array.items(), &[3, 1, 2]);
        assert_eq!(list.items(), array.items());
        assert_eq!(list.metadata(), array.metadata());
    }

    #[test]
    fn test_dictionary_keys_by_selector() {
        let rows = vec![("a", 1), ("b", 2), ("c", 3)];
        let page = DictionaryShape(|row: &(&'static str, i32)| row.0)
            .materialize(metadata(), rows.clone())
            .unwrap();

        for row in &rows {
            assert_eq!(page.get(&row.0), Some(row));
        }
        assert_eq!(page.len(), 3);
    }

    #[test]
    fn test_dictionary_fails_fast_on_duplicate_key() {
        let rows = vec![("a", 1), ("b", 2), ("a", 3)];
        let err = DictionaryShape(|row: &(&'static str, i32)| row.0)
            .materialize(metadata(), rows)
            .unwrap_err();

        assert_eq!(
            err,
            PaginationError::DuplicateKey {
                page_number: 1,
                position: 2
            }
        );
    }
}

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One page of a paginated endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            has_more: false,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            has_more: self.has_more,
        }
    }
}

/// Walk a paginated endpoint from page 1 until it runs dry.
///
/// Stops after the first page that reports no successor or comes back empty.
/// The first failing page aborts the whole walk, so callers only ever see the
/// full sequence or an error.
pub async fn fetch_all<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        let next = fetch_page(page).await?;
        let exhausted = !next.has_more || next.items.is_empty();
        items.extend(next.items);
        if exhausted {
            break;
        }
        page += 1;
    }

    Ok(items)
}

/// Incrementally loaded list state behind a tab or list screen.
#[derive(Debug)]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub selected: usize,
    pub loading: bool,
    pub error: Option<String>,
    next_page: u32,
    has_more: bool,
    loaded: bool,
    bypass_cache: bool,
    generation: u64,
}

impl<T> Default for PagedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            loading: false,
            error: None,
            next_page: 1,
            has_more: true,
            loaded: false,
            bypass_cache: false,
            generation: 0,
        }
    }
}

impl<T> PagedList<T> {
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bypass_cache(&self) -> bool {
        self.bypass_cache
    }

    /// Forget everything and prepare for page 1. Returns the new generation;
    /// pages belonging to older generations are ignored from now on.
    pub fn reset(&mut self, bypass_cache: bool) -> u64 {
        self.items.clear();
        self.selected = 0;
        self.error = None;
        self.next_page = 1;
        self.has_more = true;
        self.loaded = false;
        self.loading = true;
        self.bypass_cache = bypass_cache;
        self.generation += 1;
        self.generation
    }

    /// Drop contents without starting a load. The next load bypasses caches
    /// and anything already in flight is ignored.
    pub fn invalidate(&mut self) {
        self.reset(true);
        self.loading = false;
    }

    /// Next page to request, if there is one and nothing is in flight.
    pub fn begin_next_page(&mut self) -> Option<u32> {
        if self.loading || !self.has_more || !self.loaded {
            return None;
        }
        self.loading = true;
        Some(self.next_page)
    }

    /// Apply a delivered page. Returns false when the page is stale.
    pub fn apply(&mut self, generation: u64, page: u32, result: Page<T>) -> bool {
        if generation != self.generation || page != self.next_page {
            return false;
        }
        self.loading = false;
        self.loaded = true;
        self.error = None;
        self.has_more = result.has_more && !result.items.is_empty();
        self.next_page = page + 1;
        self.items.extend(result.items);
        true
    }

    pub fn fail(&mut self, message: String) {
        self.loading = false;
        self.loaded = true;
        self.has_more = false;
        self.error = Some(message);
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    /// True when the cursor sits on the last row and more rows exist upstream
    pub fn wants_more(&self) -> bool {
        self.has_more && !self.loading && self.selected + 1 >= self.items.len()
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if !self.items.is_empty() && self.selected < self.items.len() - 1 {
            self.selected += 1;
        }
    }

    pub fn page_up(&mut self, rows: usize) {
        self.selected = self.selected.saturating_sub(rows);
    }

    pub fn page_down(&mut self, rows: usize) {
        if !self.items.is_empty() {
            self.selected = (self.selected + rows).min(self.items.len() - 1);
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HubError;
    use std::cell::RefCell;

    fn pages() -> Vec<Page<u32>> {
        vec![
            Page {
                items: vec![1, 2],
                has_more: true,
            },
            Page {
                items: vec![3],
                has_more: true,
            },
            Page {
                items: vec![],
                has_more: true,
            },
        ]
    }

    #[tokio::test]
    async fn fetch_all_stops_at_empty_page() {
        let requested = RefCell::new(Vec::new());
        let source = pages();
        let items = fetch_all(|page| {
            requested.borrow_mut().push(page);
            let result = source[page as usize - 1].clone();
            async move { Ok(result) }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(*requested.borrow(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn fetch_all_stops_when_server_reports_no_more() {
        let requested = RefCell::new(0);
        let items = fetch_all(|page| {
            *requested.borrow_mut() += 1;
            async move {
                Ok(Page {
                    items: vec![page * 10],
                    has_more: page < 2,
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![10, 20]);
        assert_eq!(*requested.borrow(), 2);
    }

    #[tokio::test]
    async fn fetch_all_fails_fast() {
        let requested = RefCell::new(0);
        let result: Result<Vec<u32>> = fetch_all(|page| {
            *requested.borrow_mut() += 1;
            async move {
                if page == 2 {
                    Err(HubError::Api("rate limited".into()))
                } else {
                    Ok(Page {
                        items: vec![page],
                        has_more: true,
                    })
                }
            }
        })
        .await;

        assert_eq!(result, Err(HubError::Api("rate limited".into())));
        assert_eq!(*requested.borrow(), 2);
    }

    #[test]
    fn paged_list_appends_in_order() {
        let mut list = PagedList::default();
        let generation = list.reset(false);
        assert!(list.apply(
            generation,
            1,
            Page {
                items: vec!["a", "b"],
                has_more: true
            }
        ));
        assert_eq!(list.begin_next_page(), Some(2));
        assert_eq!(list.begin_next_page(), None);
        assert!(list.apply(generation, 2, Page::last(vec!["c"])));
        assert_eq!(list.items, vec!["a", "b", "c"]);
        assert_eq!(list.begin_next_page(), None);
    }

    #[test]
    fn paged_list_drops_pages_from_before_a_reset() {
        let mut list = PagedList::default();
        let old = list.reset(false);
        let new = list.reset(true);
        assert!(!list.apply(old, 1, Page::last(vec![1])));
        assert!(list.items.is_empty());
        assert!(list.loading);
        assert!(list.bypass_cache());
        assert!(list.apply(new, 1, Page::last(vec![2])));
        assert_eq!(list.items, vec![2]);
    }

    #[test]
    fn invalidated_list_reloads_from_scratch() {
        let mut list = PagedList::default();
        let generation = list.reset(false);
        list.apply(generation, 1, Page::last(vec![1]));
        list.invalidate();
        assert!(!list.is_loaded());
        assert!(!list.loading);
        assert!(list.bypass_cache());
        assert!(list.items.is_empty());
        assert!(!list.apply(generation, 1, Page::last(vec![9])));
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut list = PagedList::default();
        let generation = list.reset(false);
        list.apply(generation, 1, Page::last(vec![1, 2, 3]));
        list.page_down(10);
        assert_eq!(list.selected, 2);
        list.select_next();
        assert_eq!(list.selected, 2);
        list.page_up(10);
        assert_eq!(list.selected, 0);
        list.select_prev();
        assert_eq!(list.selected, 0);
    }
}

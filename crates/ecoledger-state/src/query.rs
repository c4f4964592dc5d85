//! Read-side queries with keyset pagination.
//!
//! Every query walks a `BTreeMap` table in key order, so pages are
//! stable across calls as long as the state is unchanged. `start_after`
//! is the last key of the previous page; `Page::next` echoes the cursor
//! to pass back for the following page.

use ecoledger_types::{Address, Batch, BatchBalance, Class, Project, SellOrder};

use crate::store::State;

pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// A keyset pagination cursor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRequest {
    /// Resume after this key; `None` starts from the beginning.
    pub start_after: Option<u64>,
    /// Maximum items to return; zero means [`DEFAULT_PAGE_LIMIT`].
    pub limit: usize,
}

impl PageRequest {
    fn effective_limit(self) -> usize {
        if self.limit == 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            self.limit
        }
    }
}

/// One page of results plus the cursor for the next page.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the next page; `None` means the listing is exhausted.
    pub next: Option<u64>,
}

fn paginate<T>(
    iter: impl Iterator<Item = (u64, T)>,
    page: PageRequest,
) -> Page<T> {
    let limit = page.effective_limit();
    let mut items = Vec::new();
    let mut last_key = None;
    let mut more = false;
    for (key, item) in iter.filter(|(k, _)| page.start_after.is_none_or(|after| *k > after)) {
        if items.len() == limit {
            more = true;
            break;
        }
        last_key = Some(key);
        items.push(item);
    }
    Page {
        items,
        next: if more { last_key } else { None },
    }
}

/// All credit classes, in key order.
#[must_use]
pub fn classes(state: &State, page: PageRequest) -> Page<Class> {
    paginate(state.classes().map(|c| (c.key, c.clone())), page)
}

/// Projects under one class, in key order.
#[must_use]
pub fn projects_by_class(state: &State, class_key: u64, page: PageRequest) -> Page<Project> {
    paginate(
        state
            .projects()
            .filter(|p| p.class_key == class_key)
            .map(|p| (p.key, p.clone())),
        page,
    )
}

/// Batches under one project, in key order.
#[must_use]
pub fn batches_by_project(state: &State, project_key: u64, page: PageRequest) -> Page<Batch> {
    paginate(
        state
            .batches()
            .filter(|b| b.project_key == project_key)
            .map(|b| (b.key, b.clone())),
        page,
    )
}

/// All balances of one address, keyed by batch, in batch-key order.
#[must_use]
pub fn balances_by_address(
    state: &State,
    addr: &Address,
    page: PageRequest,
) -> Page<(u64, BatchBalance)> {
    paginate(
        state
            .balances_for_address(addr)
            .map(|(k, bal)| (k, (k, bal.clone()))),
        page,
    )
}

/// All sell orders of one seller, in order-id order.
#[must_use]
pub fn sell_orders_by_seller(state: &State, seller: &Address, page: PageRequest) -> Page<SellOrder> {
    paginate(
        state
            .sell_orders_by_seller(seller)
            .map(|o| (o.id, o.clone())),
        page,
    )
}

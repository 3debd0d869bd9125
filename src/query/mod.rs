//! Client-side query cache.
//!
//! Each fetched collection lives under a [`QueryKey`]. Entries go stale after
//! a fixed window, and mutations invalidate whole key roots so the next read
//! goes back to the API. Derived state is never patched in place.
//!
//! Fetches are bracketed by [`QueryClient::begin`] / [`QueryClient::complete`].
//! A result is stored only if its ticket is still the newest one for the key
//! and no invalidation happened since the ticket was issued; anything else is
//! a superseded response and is dropped.

mod key;

pub use key::{Mutation, QueryKey, QueryRoot};

use std::collections::HashMap;
use std::time::Instant;

use tracing::debug;

use crate::error::ApiResult;
use crate::models::{BudgetWithProgress, Category, CategoryStats, DashboardStats, Transaction};

/// Any value the cache can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Budgets(Vec<BudgetWithProgress>),
    Budget(BudgetWithProgress),
    Transactions(Vec<Transaction>),
    DashboardStats(DashboardStats),
    CategoryStats(Vec<CategoryStats>),
    Categories(Vec<Category>),
}

/// Conversion between a concrete result type and [`QueryData`].
pub trait Cached: Clone {
    fn into_data(self) -> QueryData;
    fn from_data(data: &QueryData) -> Option<Self>;
}

macro_rules! cached {
    ($ty:ty, $variant:ident) => {
        impl Cached for $ty {
            fn into_data(self) -> QueryData {
                QueryData::$variant(self)
            }

            fn from_data(data: &QueryData) -> Option<Self> {
                match data {
                    QueryData::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

cached!(Vec<BudgetWithProgress>, Budgets);
cached!(BudgetWithProgress, Budget);
cached!(Vec<Transaction>, Transactions);
cached!(DashboardStats, DashboardStats);
cached!(Vec<CategoryStats>, CategoryStats);
cached!(Vec<Category>, Categories);

/// Proof that a fetch was started; hand it back to [`QueryClient::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: QueryKey,
    id: u64,
    generation: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

#[derive(Debug, Default)]
struct Entry {
    data: Option<QueryData>,
    fetched_at: Option<Instant>,
    stale: bool,
    latest_ticket: u64,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct QueryClient {
    entries: HashMap<QueryKey, Entry>,
    next_ticket: u64,
}

impl QueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key` if present, fresh, and of type `T`.
    pub fn get_fresh<T: Cached>(&self, key: &QueryKey, now: Instant) -> Option<T> {
        let entry = self.entries.get(key)?;
        if entry.stale {
            return None;
        }
        let fetched_at = entry.fetched_at?;
        if now.saturating_duration_since(fetched_at) >= key.stale_time() {
            return None;
        }
        entry.data.as_ref().and_then(T::from_data)
    }

    /// Last stored value for `key`, fresh or not.
    pub fn peek<T: Cached>(&self, key: &QueryKey) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|e| e.data.as_ref())
            .and_then(T::from_data)
    }

    /// Register a fetch for `key`. Any earlier ticket for the same key is
    /// superseded.
    pub fn begin(&mut self, key: &QueryKey) -> FetchTicket {
        self.next_ticket += 1;
        let entry = self.entries.entry(key.clone()).or_default();
        entry.latest_ticket = self.next_ticket;
        FetchTicket {
            key: key.clone(),
            id: self.next_ticket,
            generation: entry.generation,
        }
    }

    /// Store the result of a fetch. Returns `false` and drops the value when
    /// the ticket was superseded or the key was invalidated in the meantime.
    pub fn complete<T: Cached>(&mut self, ticket: &FetchTicket, value: T, now: Instant) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            debug!(key = %ticket.key, "discarding result for cleared key");
            return false;
        };
        if entry.latest_ticket != ticket.id || entry.generation != ticket.generation {
            debug!(key = %ticket.key, ticket = ticket.id, "discarding superseded result");
            return false;
        }
        entry.data = Some(value.into_data());
        entry.fetched_at = Some(now);
        entry.stale = false;
        true
    }

    /// Return the fresh cached value, or run `fetcher` and cache its result.
    pub fn fetch<T: Cached>(
        &mut self,
        key: QueryKey,
        now: Instant,
        fetcher: impl FnOnce() -> ApiResult<T>,
    ) -> ApiResult<T> {
        if let Some(hit) = self.get_fresh::<T>(&key, now) {
            debug!(%key, "cache hit");
            return Ok(hit);
        }
        debug!(%key, "cache miss");
        let ticket = self.begin(&key);
        let value = fetcher()?;
        self.complete(&ticket, value.clone(), now);
        Ok(value)
    }

    /// Mark every entry under `root` stale and cut off in-flight fetches.
    /// Returns the number of entries touched.
    pub fn invalidate(&mut self, root: QueryRoot) -> usize {
        let mut touched = 0;
        for (key, entry) in self.entries.iter_mut() {
            if key.root() == root {
                entry.stale = true;
                entry.generation += 1;
                touched += 1;
            }
        }
        debug!(root = root.as_str(), touched, "invalidated");
        touched
    }

    /// Apply the invalidation rules of a successful mutation.
    pub fn on_success(&mut self, mutation: Mutation) {
        for root in mutation.invalidates() {
            self.invalidate(*root);
        }
    }

    pub fn is_stale(&self, key: &QueryKey, now: Instant) -> bool {
        match self.entries.get(key) {
            Some(entry) => {
                entry.stale
                    || entry
                        .fetched_at
                        .map_or(true, |at| now.saturating_duration_since(at) >= key.stale_time())
            }
            None => true,
        }
    }

    /// Drop everything; used on logout.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

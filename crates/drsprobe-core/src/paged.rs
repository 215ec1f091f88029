//! Count-then-fetch retrieval with a single retry on truncation.

use drsprobe_abi::{Status, StatusKind, VersionedRecord};
use tracing::{debug, warn};

use crate::error::{DrsError, Result};

/// Something that can report how many items it holds and copy a page of
/// them into a caller-provided buffer.
pub trait PagedSource {
    type Item: VersionedRecord + Default + Copy;

    /// Used in errors and logs ("application", "setting").
    const LABEL: &'static str;

    /// The owning object's current item count. May grow between calls.
    fn reported_count(&self) -> Result<u32>;

    /// `count` holds the buffer capacity on entry and the number written on exit.
    fn enumerate(&self, start_index: u32, count: &mut u32, buf: &mut [Self::Item]) -> Status;

    fn error_message(&self, status: Status) -> String;
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Capacity of the buffer that produced `items`.
    pub capacity: u32,
    pub retried: bool,
}

impl<T> Page<T> {
    fn empty(capacity: u32, retried: bool) -> Self {
        Self {
            items: Vec::new(),
            capacity,
            retried,
        }
    }

    /// What the service actually returned; may be below `capacity`.
    pub fn actual_count(&self) -> u32 {
        self.items.len() as u32
    }
}

pub struct PagedFetch<S> {
    source: S,
    limit: u32,
}

impl<S: PagedSource> PagedFetch<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            limit: MAX_PAGE_ITEMS,
        }
    }

    /// Cap on the items a single page may hold; defaults to `MAX_PAGE_ITEMS`.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Query the count, then fetch everything from `page_start` on.
    pub fn fetch(&self, page_start: u32) -> Result<Page<S::Item>> {
        let capacity = self.source.reported_count()?.saturating_sub(page_start);
        self.fetch_with_capacity(page_start, capacity)
    }

    /// Fetch with a count the caller already holds. A zero capacity means an
    /// empty list and never reaches the service.
    pub fn fetch_with_capacity(&self, page_start: u32, capacity: u32) -> Result<Page<S::Item>> {
        if capacity == 0 {
            return Ok(Page::empty(0, false));
        }

        let mut capacity = self.within_limit(capacity)?;
        let mut retried = false;
        loop {
            let mut buf = self.alloc_page(capacity)?;
            let mut count = capacity;
            let status = self.source.enumerate(page_start, &mut count, &mut buf);

            let wanted = match status.kind() {
                Some(StatusKind::Ok) if count <= capacity => {
                    buf.truncate(count as usize);
                    return Ok(Page {
                        items: buf,
                        capacity,
                        retried,
                    });
                }
                // More reported than fits is truncation too; never keep a partial list.
                Some(StatusKind::Ok) | Some(StatusKind::InsufficientBuffer) => count,
                Some(StatusKind::EndOfEnumeration) => return Ok(Page::empty(capacity, retried)),
                Some(StatusKind::Failure) => {
                    return Err(DrsError::EnumerationFailed {
                        what: S::LABEL,
                        status,
                        message: self.source.error_message(status),
                    })
                }
                None => {
                    return Err(DrsError::UnknownStatus {
                        code: status.code(),
                        message: self.source.error_message(status),
                    })
                }
            };

            if retried {
                return Err(DrsError::TruncatedResult {
                    what: S::LABEL,
                    capacity,
                    reported: wanted.max(capacity),
                });
            }

            let fresh = self.source.reported_count()?.saturating_sub(page_start);
            let needed = self.within_limit(fresh.max(wanted))?;
            let grown = needed.max(capacity.saturating_mul(2)).min(self.limit);
            debug!(
                target: "drsprobe::paged",
                what = S::LABEL,
                capacity,
                grown,
                "buffer too small, retrying once"
            );
            capacity = grown;
            retried = true;
        }
    }

    fn within_limit(&self, requested: u32) -> Result<u32> {
        if requested > self.limit {
            warn!(
                target: "drsprobe::paged",
                what = S::LABEL,
                requested,
                limit = self.limit,
                "service reported an implausible item count"
            );
            return Err(DrsError::BufferUnavailable {
                what: S::LABEL,
                requested,
                limit: self.limit,
            });
        }
        Ok(requested)
    }

    /// Every element gets its own version stamp, not just the first.
    fn alloc_page(&self, capacity: u32) -> Result<Vec<S::Item>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity as usize)
            .map_err(|_| DrsError::BufferUnavailable {
                what: S::LABEL,
                requested: capacity,
                limit: self.limit,
            })?;
        buf.resize(capacity as usize, S::Item::default());
        Ok(buf)
    }
}

/// Default page cap. Counts above it come from a confused or corrupted
/// service, not from a real profile.
pub const MAX_PAGE_ITEMS: u32 = 4096;

//! Deterministic paging over a device's report history.

use serde::Serialize;

use crate::db::{StatusReport, Store};
use crate::error::{Error, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// One page of a device's history, most recent reports first.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub device_id: String,
    pub statuses: Vec<StatusReport>,
    pub total_records: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Number of pages needed for `total_records` at `page_size` records per
/// page. An empty history still has one (empty) page.
pub fn total_pages(total_records: i64, page_size: u32) -> u32 {
    if total_records == 0 {
        return 1;
    }
    (total_records as u64).div_ceil(page_size as u64) as u32
}

/// Fetch one page of a device's history in descending `(timestamp, id)`
/// order.
///
/// `page` is 1-based; `page_size` must be in [1, 100]. Fails with
/// `DeviceNotFound` when the device has never reported and with
/// `PageOutOfRange` when `page` exceeds the page count.
pub fn history_page(
    store: &Store,
    device_id: &str,
    page: u32,
    page_size: u32,
) -> Result<HistoryPage> {
    if page < 1 {
        return Err(Error::Validation("page must be >= 1".to_string()));
    }
    if page_size < 1 || page_size > MAX_PAGE_SIZE {
        return Err(Error::Validation(format!(
            "page_size must be in [1, {}]",
            MAX_PAGE_SIZE
        )));
    }

    let total_records = store.count_for_device(device_id)?;
    if total_records == 0 {
        return Err(Error::DeviceNotFound(device_id.to_string()));
    }

    let total = total_pages(total_records, page_size);
    if page > total {
        return Err(Error::PageOutOfRange {
            page,
            total_pages: total,
        });
    }

    let offset = (page as i64 - 1) * page_size as i64;
    let statuses = store.history_slice(device_id, page_size as i64, offset)?;

    Ok(HistoryPage {
        device_id: device_id.to_string(),
        statuses,
        total_records,
        page,
        page_size,
        total_pages: total,
    })
}

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OrderStatus {
    Pending,
    Claimed,
    PickedUp,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub client_phone: String,
    pub runner_phone: Option<String>,
    pub pickup_location: String,
    pub delivery_location: String,
    pub description: String,
    pub item_price: u32,
    pub delivery_fee: u32,
    pub total_price: u32,
    pub status: OrderStatus,
    pub pickup_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

static LAST_ISSUED_MS: AtomicI64 = AtomicI64::new(0);

/// `ORD<millis>` ids, strictly increasing even when two orders land in the
/// same millisecond.
pub fn next_order_id(now: DateTime<Utc>) -> String {
    let now_ms = now.timestamp_millis();
    let mut prev = LAST_ISSUED_MS.load(Ordering::Relaxed);
    loop {
        let candidate = now_ms.max(prev + 1);
        match LAST_ISSUED_MS.compare_exchange_weak(
            prev,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return format!("ORD{candidate}"),
            Err(actual) => prev = actual,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingErrandType,
    AwaitingStore,
    AwaitingPickup,
    AwaitingDelivery,
    AwaitingDescription,
    AwaitingPrice,
    AwaitingConfirmation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrandType {
    PickDeliver,
    PurchaseDeliver,
}

/// Order data accumulated across a dialogue, all optional until the
/// matching state has been passed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Draft {
    pub errand_type: Option<ErrandType>,
    pub pickup_location: Option<String>,
    pub delivery_location: Option<String>,
    pub description: Option<String>,
    pub item_price: Option<u32>,
    pub delivery_fee: Option<u32>,
    pub total_price: Option<u32>,
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        self.errand_type.is_none()
            && self.pickup_location.is_none()
            && self.delivery_location.is_none()
            && self.description.is_none()
            && self.item_price.is_none()
            && self.delivery_fee.is_none()
            && self.total_price.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub phone: String,
    pub state: SessionState,
    pub draft: Draft,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(phone: &str) -> Self {
        let now = Utc::now();
        Self {
            phone: phone.to_string(),
            state: SessionState::Idle,
            draft: Draft::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// Back to `Idle` with an empty draft, after confirm/cancel.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.draft = Draft::default();
        self.updated_at = Utc::now();
    }
}

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::models::order::Order;
use crate::models::profile::UserProfile;
use crate::models::session::Session;
use crate::observability::metrics::Metrics;
use crate::transport::InboundMessage;

/// Keyed document stores plus the two engine queues. The DashMap entry
/// guard is what gives claim its atomic check-and-set.
pub struct AppState {
    pub profiles: DashMap<String, UserProfile>,
    pub sessions: DashMap<String, Session>,
    pub orders: DashMap<String, Order>,
    pub dispatch_tx: mpsc::Sender<Order>,
    pub inbound_tx: mpsc::Sender<InboundMessage>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        dispatch_queue_size: usize,
        inbound_queue_size: usize,
    ) -> (Self, mpsc::Receiver<Order>, mpsc::Receiver<InboundMessage>) {
        let (dispatch_tx, dispatch_rx) = mpsc::channel(dispatch_queue_size);
        let (inbound_tx, inbound_rx) = mpsc::channel(inbound_queue_size);

        (
            Self {
                profiles: DashMap::new(),
                sessions: DashMap::new(),
                orders: DashMap::new(),
                dispatch_tx,
                inbound_tx,
                metrics: Metrics::new(),
            },
            dispatch_rx,
            inbound_rx,
        )
    }
}

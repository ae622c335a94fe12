use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::engine::messages;
use crate::models::order::Order;
use crate::models::profile::Role;
use crate::state::AppState;
use crate::transport::MessageSender;

pub async fn run_dispatch_engine(
    state: Arc<AppState>,
    sender: Arc<dyn MessageSender>,
    mut offer_rx: mpsc::Receiver<Order>,
) {
    info!("dispatch engine started");

    while let Some(order) = offer_rx.recv().await {
        state.metrics.dispatch_queue_depth.dec();

        let start = Instant::now();
        let outcome = fan_out_offer(&state, sender.as_ref(), &order).await;
        let elapsed = start.elapsed().as_secs_f64();
        state
            .metrics
            .fanout_latency_seconds
            .with_label_values(&[outcome])
            .observe(elapsed);
    }

    warn!("dispatch engine stopped: queue channel closed");
}

/// Offer a new order to every registered runner. Each runner's offer pointer
/// is written before the text that references it goes out, so an immediate
/// `yes` reply resolves against a consistent pointer.
pub async fn fan_out_offer(
    state: &AppState,
    sender: &dyn MessageSender,
    order: &Order,
) -> &'static str {
    let runners: Vec<String> = state
        .profiles
        .iter()
        .filter_map(|entry| {
            let profile = entry.value();
            if profile.role == Role::Runner {
                Some(profile.phone.clone())
            } else {
                None
            }
        })
        .collect();

    if runners.is_empty() {
        warn!(order_id = %order.order_id, "no registered runners; order stays pending");
        return "no_runners";
    }

    let text = messages::offer(order);
    let mut failures = 0usize;

    for phone in &runners {
        if let Some(mut profile) = state.profiles.get_mut(phone) {
            profile.last_offered_order = Some(order.order_id.clone());
        }

        if let Err(err) = sender.send(phone, &text).await {
            failures += 1;
            warn!(
                order_id = %order.order_id,
                runner = %phone,
                error = %err,
                "offer send failed; continuing fan-out"
            );
        }
    }

    info!(
        order_id = %order.order_id,
        runners = runners.len(),
        failures,
        "offer fanned out"
    );

    if failures == 0 {
        "complete"
    } else {
        "partial"
    }
}

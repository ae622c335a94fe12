use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::engine::messages;
use crate::engine::pricing::FeeQuote;
use crate::error::AppError;
use crate::models::order::{next_order_id, Order, OrderStatus};
use crate::state::AppState;
use crate::transport::MessageSender;

/// Result of the atomic claim attempt.
pub enum ClaimOutcome {
    Claimed(Order),
    AlreadyTaken,
    NotFound,
}

/// What a runner's claim message points at.
pub enum ClaimTarget<'a> {
    /// A bare `yes`, resolved through the runner's last-offered pointer.
    LastOffered,
    /// `claim <orderId>`.
    Explicit(&'a str),
}

/// Insert a freshly built order under its id. The vacant-entry insert is the
/// uniqueness constraint on order ids.
pub(crate) fn create_order(
    state: &AppState,
    client_phone: &str,
    pickup_location: String,
    delivery_location: String,
    description: String,
    item_price: u32,
    quote: FeeQuote,
    source: &'static str,
) -> Result<Order, AppError> {
    let now = Utc::now();
    let order = Order {
        order_id: next_order_id(now),
        client_phone: client_phone.to_string(),
        runner_phone: None,
        pickup_location,
        delivery_location,
        description,
        item_price,
        delivery_fee: quote.delivery_fee,
        total_price: quote.total_price,
        status: OrderStatus::Pending,
        pickup_time: None,
        delivery_time: None,
        created_at: now,
        updated_at: now,
    };

    match state.orders.entry(order.order_id.clone()) {
        dashmap::mapref::entry::Entry::Occupied(_) => Err(AppError::Internal(format!(
            "order id collision on {}",
            order.order_id
        ))),
        dashmap::mapref::entry::Entry::Vacant(slot) => {
            slot.insert(order.clone());
            state
                .metrics
                .orders_created_total
                .with_label_values(&[source])
                .inc();
            Ok(order)
        }
    }
}

/// The claim arbitration point. Status is checked and flipped under the
/// order's entry guard, so under N concurrent calls exactly one sees
/// `Pending` and wins; everyone else gets `AlreadyTaken`.
pub fn try_claim(
    state: &AppState,
    order_id: &str,
    runner_phone: &str,
    now: DateTime<Utc>,
) -> ClaimOutcome {
    let Some(mut order) = state.orders.get_mut(order_id) else {
        return ClaimOutcome::NotFound;
    };

    if order.status != OrderStatus::Pending {
        return ClaimOutcome::AlreadyTaken;
    }

    order.status = OrderStatus::Claimed;
    order.runner_phone = Some(runner_phone.to_string());
    order.updated_at = now;
    ClaimOutcome::Claimed(order.clone())
}

/// Chat-facing claim. Every outcome resolves to reply text; losing a race is
/// a normal answer here, not an error.
pub async fn claim(
    state: &AppState,
    sender: &dyn MessageSender,
    runner_phone: &str,
    target: ClaimTarget<'_>,
) -> Result<Option<String>, AppError> {
    let order_id = match target {
        ClaimTarget::Explicit(id) => id.trim().to_uppercase(),
        ClaimTarget::LastOffered => {
            let Some(id) = state
                .profiles
                .get(runner_phone)
                .and_then(|profile| profile.last_offered_order.clone())
            else {
                return Ok(Some(messages::no_offer()));
            };
            id
        }
    };

    match try_claim(state, &order_id, runner_phone, Utc::now()) {
        ClaimOutcome::Claimed(order) => {
            clear_offers_for(state, &order.order_id);
            state.metrics.claims_total.with_label_values(&["won"]).inc();
            info!(order_id = %order.order_id, runner = %runner_phone, "order claimed");

            let mut reply = messages::claimed_runner(&order);
            if !notify(sender, &order.client_phone, &messages::claimed_client(&order)).await {
                reply.push_str(&messages::notify_failure_note());
            }
            Ok(Some(reply))
        }
        ClaimOutcome::AlreadyTaken => {
            clear_offer(state, runner_phone, &order_id);
            state.metrics.claims_total.with_label_values(&["lost"]).inc();
            Ok(Some(messages::order_unavailable()))
        }
        ClaimOutcome::NotFound => {
            clear_offer(state, runner_phone, &order_id);
            state
                .metrics
                .claims_total
                .with_label_values(&["not_found"])
                .inc();
            Ok(Some(messages::order_unavailable()))
        }
    }
}

/// `pickup`: the runner is at the pickup point. Advances the oldest order
/// they hold in `Claimed`.
pub async fn pickup(
    state: &AppState,
    sender: &dyn MessageSender,
    runner_phone: &str,
) -> Result<Option<String>, AppError> {
    let Some(order_id) = oldest_for_runner(state, runner_phone, OrderStatus::Claimed) else {
        return Ok(Some(messages::nothing_to_pickup()));
    };

    let updated = {
        let Some(mut order) = state.orders.get_mut(&order_id) else {
            return Ok(Some(messages::nothing_to_pickup()));
        };
        if order.status != OrderStatus::Claimed {
            return Ok(Some(messages::nothing_to_pickup()));
        }
        let now = Utc::now();
        order.status = OrderStatus::PickedUp;
        order.pickup_time = Some(now);
        order.updated_at = now;
        order.clone()
    };

    info!(order_id = %updated.order_id, runner = %runner_phone, "order picked up");

    let mut reply = messages::picked_up_runner(&updated);
    if !notify(sender, &updated.client_phone, &messages::picked_up_client(&updated)).await {
        reply.push_str(&messages::notify_failure_note());
    }
    Ok(Some(reply))
}

/// `delivered`: closes out the oldest order the runner holds in `PickedUp`
/// and reports how long the leg took.
pub async fn deliver(
    state: &AppState,
    sender: &dyn MessageSender,
    runner_phone: &str,
) -> Result<Option<String>, AppError> {
    let Some(order_id) = oldest_for_runner(state, runner_phone, OrderStatus::PickedUp) else {
        return Ok(Some(messages::nothing_to_deliver()));
    };

    let updated = {
        let Some(mut order) = state.orders.get_mut(&order_id) else {
            return Ok(Some(messages::nothing_to_deliver()));
        };
        if order.status != OrderStatus::PickedUp {
            return Ok(Some(messages::nothing_to_deliver()));
        }
        let now = Utc::now();
        order.status = OrderStatus::Delivered;
        order.delivery_time = Some(now);
        order.updated_at = now;
        order.clone()
    };

    let minutes = match (updated.pickup_time, updated.delivery_time) {
        (Some(picked), Some(delivered)) => (delivered - picked).num_minutes(),
        _ => 0,
    };
    let duration = messages::fmt_duration(minutes);

    info!(
        order_id = %updated.order_id,
        runner = %runner_phone,
        minutes,
        "order delivered"
    );

    let mut reply = messages::delivered_runner(&updated, &duration);
    if !notify(
        sender,
        &updated.client_phone,
        &messages::delivered_client(&updated, &duration),
    )
    .await
    {
        reply.push_str(&messages::notify_failure_note());
    }
    Ok(Some(reply))
}

/// Administrative cancellation. Open orders only; terminal states conflict.
pub fn cancel_order(state: &AppState, order_id: &str) -> Result<Order, AppError> {
    let mut order = state
        .orders
        .get_mut(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    if !matches!(order.status, OrderStatus::Pending | OrderStatus::Claimed) {
        return Err(AppError::Conflict(format!(
            "order {order_id} can no longer be cancelled"
        )));
    }

    order.status = OrderStatus::Cancelled;
    order.updated_at = Utc::now();
    info!(order_id = %order.order_id, "order cancelled");
    Ok(order.clone())
}

fn oldest_for_runner(state: &AppState, runner_phone: &str, status: OrderStatus) -> Option<String> {
    state
        .orders
        .iter()
        .filter(|entry| {
            let order = entry.value();
            order.status == status && order.runner_phone.as_deref() == Some(runner_phone)
        })
        .min_by_key(|entry| entry.value().created_at)
        .map(|entry| entry.key().clone())
}

/// Drop the stale offer pointer from every runner profile that still
/// references a claimed order.
fn clear_offers_for(state: &AppState, order_id: &str) {
    for mut entry in state.profiles.iter_mut() {
        if entry.value().last_offered_order.as_deref() == Some(order_id) {
            entry.value_mut().last_offered_order = None;
        }
    }
}

fn clear_offer(state: &AppState, runner_phone: &str, order_id: &str) {
    if let Some(mut profile) = state.profiles.get_mut(runner_phone) {
        if profile.last_offered_order.as_deref() == Some(order_id) {
            profile.last_offered_order = None;
        }
    }
}

async fn notify(sender: &dyn MessageSender, recipient: &str, text: &str) -> bool {
    match sender.send(recipient, text).await {
        Ok(()) => true,
        Err(err) => {
            warn!(recipient = %recipient, error = %err, "failed to notify counterparty");
            false
        }
    }
}

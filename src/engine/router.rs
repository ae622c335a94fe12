use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::engine::lifecycle::{self, ClaimTarget};
use crate::engine::messages;
use crate::engine::pricing::compute_fee;
use crate::engine::queue::enqueue_offer;
use crate::engine::session::{self, MAX_ITEM_PRICE, MIN_ITEM_PRICE};
use crate::error::AppError;
use crate::state::AppState;
use crate::transport::{InboundMessage, MessageSender};

/// Drains the inbound channel one message at a time, which keeps each
/// participant's messages in arrival order. A processing error is answered
/// with an apology and never takes the loop down.
pub async fn run_message_engine(
    state: Arc<AppState>,
    sender: Arc<dyn MessageSender>,
    mut inbound_rx: mpsc::Receiver<InboundMessage>,
) {
    info!("message engine started");

    while let Some(msg) = inbound_rx.recv().await {
        if msg.from_self || msg.text.trim().is_empty() {
            state
                .metrics
                .messages_total
                .with_label_values(&["ignored"])
                .inc();
            continue;
        }

        match route_message(&state, sender.as_ref(), &msg).await {
            Ok(Some(reply)) => {
                state
                    .metrics
                    .messages_total
                    .with_label_values(&["handled"])
                    .inc();
                if let Err(err) = sender.send(&msg.sender, &reply).await {
                    warn!(recipient = %msg.sender, error = %err, "reply send failed");
                }
            }
            Ok(None) => {
                state
                    .metrics
                    .messages_total
                    .with_label_values(&["ignored"])
                    .inc();
            }
            Err(err) => {
                state
                    .metrics
                    .messages_total
                    .with_label_values(&["failed"])
                    .inc();
                error!(sender = %msg.sender, error = %err, "message processing failed");
                if let Err(send_err) = sender.send(&msg.sender, &messages::apology()).await {
                    warn!(recipient = %msg.sender, error = %send_err, "apology send failed");
                }
            }
        }
    }

    warn!("message engine stopped: inbound channel closed");
}

/// Classify one inbound text and dispatch it. Keyword rules are checked in a
/// fixed priority order; whatever falls through belongs to the dialogue when
/// one is open and is ignored otherwise.
pub async fn route_message(
    state: &AppState,
    sender: &dyn MessageSender,
    msg: &InboundMessage,
) -> Result<Option<String>, AppError> {
    let text = msg.text.trim();
    let lowered = text.to_lowercase();
    let phone = msg.sender.as_str();

    if lowered == "cancel" {
        return Ok(session::cancel(state, phone));
    }

    if matches!(lowered.as_str(), "hi" | "hello" | "hey" | "start") {
        return Ok(Some(messages::menu()));
    }

    // Digits belong to the dialogue in every state: a menu choice at idle,
    // an errand-type choice or a plain price later on.
    if text.chars().all(|c| c.is_ascii_digit()) {
        return session::handle_session_input(state, phone, text).await;
    }

    if lowered == "help" {
        return Ok(Some(messages::help()));
    }

    if lowered.starts_with("new order") {
        return create_from_shorthand(state, phone, text).await.map(Some);
    }

    if lowered == "yes" {
        return lifecycle::claim(state, sender, phone, ClaimTarget::LastOffered).await;
    }
    if lowered == "claim" {
        return Ok(Some(messages::claim_usage()));
    }
    if let Some(id) = lowered.strip_prefix("claim ") {
        return lifecycle::claim(state, sender, phone, ClaimTarget::Explicit(id)).await;
    }

    if lowered == "pickup" {
        return lifecycle::pickup(state, sender, phone).await;
    }
    if lowered == "delivered" {
        return lifecycle::deliver(state, sender, phone).await;
    }

    let in_dialogue = state
        .sessions
        .get(phone)
        .map(|entry| !entry.value().is_idle())
        .unwrap_or(false);
    if in_dialogue {
        return session::handle_session_input(state, phone, text).await;
    }

    // Unrelated chatter from an idle participant gets no acknowledgment.
    Ok(None)
}

/// Legacy one-line order: `New Order | pickup | delivery | description |
/// price`. Field rules are the dialogue's; the format check runs before any
/// of them.
async fn create_from_shorthand(
    state: &AppState,
    phone: &str,
    text: &str,
) -> Result<String, AppError> {
    let segments: Vec<&str> = text.split('|').map(str::trim).collect();
    if segments.len() < 5 {
        return Ok(messages::invalid_shorthand());
    }

    let pickup = segments[1];
    let delivery = segments[2];
    let description = segments[3];
    let price_text = segments[4];

    if !session::location_ok(pickup) || !session::location_ok(delivery) {
        return Ok(messages::bad_location());
    }
    if pickup.to_lowercase() == delivery.to_lowercase() {
        return Ok(messages::same_location());
    }
    if !session::description_ok(description) {
        return Ok(messages::bad_description());
    }
    let Some(item_price) = session::parse_amount(price_text) else {
        return Ok(messages::price_not_numeric());
    };
    if !(MIN_ITEM_PRICE..=MAX_ITEM_PRICE).contains(&item_price) {
        return Ok(messages::price_out_of_range());
    }

    let order = lifecycle::create_order(
        state,
        phone,
        pickup.to_string(),
        delivery.to_string(),
        description.to_string(),
        item_price,
        compute_fee(item_price),
        "shorthand",
    )?;

    info!(order_id = %order.order_id, client = %phone, "order created from shorthand");
    enqueue_offer(state, order.clone()).await?;
    Ok(messages::order_created(&order))
}

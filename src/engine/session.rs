use chrono::Utc;
use tracing::info;

use crate::engine::lifecycle::create_order;
use crate::engine::messages;
use crate::engine::pricing::{compute_fee, FeeQuote};
use crate::engine::queue::enqueue_offer;
use crate::error::AppError;
use crate::models::order::Order;
use crate::models::session::{Draft, ErrandType, Session, SessionState};
use crate::state::AppState;

pub const MIN_ITEM_PRICE: u32 = 500;
pub const MAX_ITEM_PRICE: u32 = 50_000;

/// Result of feeding one input to the dialogue.
pub enum StepOutcome {
    Reply(String),
    /// Unrelated chatter at `Idle`; deliberately unanswered.
    Silent,
    /// The requester confirmed; the session is already reset.
    Confirmed(Draft),
}

/// One turn of the dialogue. Pure transition over (state, input); invalid
/// input re-prompts without touching the draft, so redelivered messages
/// cannot corrupt it.
pub fn advance(session: &mut Session, input: &str) -> StepOutcome {
    let text = input.trim();
    session.updated_at = Utc::now();

    match session.state {
        SessionState::Idle => match text {
            "1" => {
                session.state = SessionState::AwaitingErrandType;
                StepOutcome::Reply(messages::ask_errand_type())
            }
            "2" => StepOutcome::Reply(messages::help()),
            _ => StepOutcome::Silent,
        },

        SessionState::AwaitingErrandType => match text {
            "1" => {
                session.draft.errand_type = Some(ErrandType::PickDeliver);
                session.state = SessionState::AwaitingPickup;
                StepOutcome::Reply(messages::ask_pickup())
            }
            "2" => {
                session.draft.errand_type = Some(ErrandType::PurchaseDeliver);
                session.state = SessionState::AwaitingStore;
                StepOutcome::Reply(messages::ask_store())
            }
            _ => StepOutcome::Reply(messages::invalid_errand_type()),
        },

        // The store branch reuses the pickup slot: either way it is where
        // the runner starts the errand.
        SessionState::AwaitingPickup | SessionState::AwaitingStore => {
            if !location_ok(text) {
                return StepOutcome::Reply(messages::bad_location());
            }
            session.draft.pickup_location = Some(text.to_string());
            session.state = SessionState::AwaitingDelivery;
            StepOutcome::Reply(messages::ask_delivery())
        }

        SessionState::AwaitingDelivery => {
            if !location_ok(text) {
                return StepOutcome::Reply(messages::bad_location());
            }
            let same_as_pickup = session
                .draft
                .pickup_location
                .as_deref()
                .is_some_and(|pickup| pickup.to_lowercase() == text.to_lowercase());
            if same_as_pickup {
                return StepOutcome::Reply(messages::same_location());
            }
            session.draft.delivery_location = Some(text.to_string());
            session.state = SessionState::AwaitingDescription;
            StepOutcome::Reply(messages::ask_description())
        }

        SessionState::AwaitingDescription => {
            if !description_ok(text) {
                return StepOutcome::Reply(messages::bad_description());
            }
            session.draft.description = Some(text.to_string());
            session.state = SessionState::AwaitingPrice;
            StepOutcome::Reply(messages::ask_price())
        }

        SessionState::AwaitingPrice => {
            let Some(item_price) = parse_amount(text) else {
                return StepOutcome::Reply(messages::price_not_numeric());
            };
            if !(MIN_ITEM_PRICE..=MAX_ITEM_PRICE).contains(&item_price) {
                return StepOutcome::Reply(messages::price_out_of_range());
            }

            let quote = compute_fee(item_price);
            session.draft.item_price = Some(item_price);
            session.draft.delivery_fee = Some(quote.delivery_fee);
            session.draft.total_price = Some(quote.total_price);
            session.state = SessionState::AwaitingConfirmation;

            StepOutcome::Reply(messages::summary(
                session.draft.pickup_location.as_deref().unwrap_or_default(),
                session.draft.delivery_location.as_deref().unwrap_or_default(),
                session.draft.description.as_deref().unwrap_or_default(),
                item_price,
                quote.delivery_fee,
                quote.total_price,
            ))
        }

        SessionState::AwaitingConfirmation => {
            if text.eq_ignore_ascii_case("confirm") {
                let draft = std::mem::take(&mut session.draft);
                session.reset();
                StepOutcome::Confirmed(draft)
            } else {
                StepOutcome::Reply(messages::confirm_reprompt())
            }
        }
    }
}

/// Global `cancel` rule; the router runs this before any state-specific
/// handling. Silent when there is nothing to cancel.
pub fn cancel(state: &AppState, phone: &str) -> Option<String> {
    let mut session = state.sessions.get_mut(phone)?;
    if session.is_idle() {
        return None;
    }
    session.reset();
    Some(messages::cancelled())
}

/// Fetch-or-create the session, run one turn, write it back, and turn a
/// confirmed draft into a pending order plus a fan-out.
pub async fn handle_session_input(
    state: &AppState,
    phone: &str,
    text: &str,
) -> Result<Option<String>, AppError> {
    let mut session = state
        .sessions
        .get(phone)
        .map(|entry| entry.value().clone())
        .unwrap_or_else(|| Session::new(phone));

    let outcome = advance(&mut session, text);
    state.sessions.insert(phone.to_string(), session);

    match outcome {
        StepOutcome::Reply(reply) => Ok(Some(reply)),
        StepOutcome::Silent => Ok(None),
        StepOutcome::Confirmed(draft) => {
            let order = materialize_order(state, phone, draft).await?;
            Ok(Some(messages::order_created(&order)))
        }
    }
}

async fn materialize_order(state: &AppState, phone: &str, draft: Draft) -> Result<Order, AppError> {
    let Draft {
        errand_type: _,
        pickup_location: Some(pickup_location),
        delivery_location: Some(delivery_location),
        description: Some(description),
        item_price: Some(item_price),
        delivery_fee: Some(delivery_fee),
        total_price: Some(total_price),
    } = draft
    else {
        return Err(AppError::Internal(
            "confirmed draft is missing fields".to_string(),
        ));
    };

    let order = create_order(
        state,
        phone,
        pickup_location,
        delivery_location,
        description,
        item_price,
        FeeQuote {
            delivery_fee,
            total_price,
        },
        "session",
    )?;

    info!(
        order_id = %order.order_id,
        client = %order.client_phone,
        total = order.total_price,
        "order created from dialogue"
    );

    enqueue_offer(state, order.clone()).await?;
    Ok(order)
}

pub(crate) fn location_ok(text: &str) -> bool {
    let len = text.chars().count();
    (3..=100).contains(&len)
}

pub(crate) fn description_ok(text: &str) -> bool {
    let len = text.chars().count();
    (3..=200).contains(&len)
}

/// "Parse integer from digits": every ASCII digit in the input, in order,
/// so `₦2,500` reads as 2500. `None` when there are no digits at all;
/// values too large for u32 collapse to `u32::MAX` and fail range checks.
pub(crate) fn parse_amount(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse::<u32>().unwrap_or(u32::MAX))
}

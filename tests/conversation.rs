use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use quickrun_bot::engine::dispatch::{self, fan_out_offer};
use quickrun_bot::engine::lifecycle::{self, ClaimTarget};
use quickrun_bot::engine::onboarding::register_runner;
use quickrun_bot::engine::router::{self, route_message};
use quickrun_bot::error::AppError;
use quickrun_bot::models::order::{Order, OrderStatus};
use quickrun_bot::state::AppState;
use quickrun_bot::transport::{InboundMessage, MessageSender};
use tokio::sync::Barrier;

const CLIENT: &str = "2348010000001";

/// Captures outbound traffic; recipients marked as failing refuse sends.
#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingSender {
    fn sent_to(&self, recipient: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, text)| text.clone())
            .collect()
    }

    fn fail_for(&self, recipient: &str) {
        self.failing.lock().unwrap().insert(recipient.to_string());
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), AppError> {
        if self.failing.lock().unwrap().contains(recipient) {
            return Err(AppError::Transport("recipient unreachable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        Ok(())
    }
}

fn inbound(sender: &str, text: &str) -> InboundMessage {
    InboundMessage {
        sender: sender.to_string(),
        text: text.to_string(),
        from_self: false,
    }
}

async fn send(
    state: &AppState,
    sender: &RecordingSender,
    phone: &str,
    text: &str,
) -> Option<String> {
    route_message(state, sender, &inbound(phone, text)).await.unwrap()
}

fn seed_order(state: &AppState, order_id: &str, status: OrderStatus, runner: Option<&str>) {
    let now = Utc::now();
    state.orders.insert(
        order_id.to_string(),
        Order {
            order_id: order_id.to_string(),
            client_phone: CLIENT.to_string(),
            runner_phone: runner.map(str::to_string),
            pickup_location: "Shoprite Ikeja".to_string(),
            delivery_location: "Magodo Phase 2".to_string(),
            description: "2 bags of groceries".to_string(),
            item_price: 2500,
            delivery_fee: 500,
            total_price: 3000,
            status,
            pickup_time: None,
            delivery_time: None,
            created_at: now,
            updated_at: now,
        },
    );
}

#[tokio::test]
async fn guided_dialogue_creates_exactly_one_order() {
    let (state, mut dispatch_rx, _inbound_rx) = AppState::new(8, 8);
    let sender = RecordingSender::default();

    let menu = send(&state, &sender, CLIENT, "hi").await.unwrap();
    assert!(menu.contains("Welcome to QuickRun"));

    send(&state, &sender, CLIENT, "1").await.unwrap();
    send(&state, &sender, CLIENT, "1").await.unwrap();
    send(&state, &sender, CLIENT, "Shoprite Ikeja").await.unwrap();
    send(&state, &sender, CLIENT, "Magodo Phase 2").await.unwrap();
    send(&state, &sender, CLIENT, "2 bags of groceries").await.unwrap();

    let summary = send(&state, &sender, CLIENT, "2500").await.unwrap();
    assert!(summary.contains("₦2500"));
    assert!(summary.contains("₦500"));
    assert!(summary.contains("₦3000"));

    let created = send(&state, &sender, CLIENT, "confirm").await.unwrap();
    assert!(created.contains("created!"));

    assert_eq!(state.orders.len(), 1);
    let order = dispatch_rx.recv().await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.client_phone, CLIENT);
    assert_eq!(order.item_price, 2500);
    assert_eq!(order.total_price, 3000);
    assert!(order.runner_phone.is_none());

    let session = state.sessions.get(CLIENT).unwrap();
    assert!(session.is_idle());
    assert!(session.draft.is_empty());
}

#[tokio::test]
async fn cancel_from_any_state_resets_without_creating_an_order() {
    let sender = RecordingSender::default();
    let walks: &[&[&str]] = &[
        &["1"],
        &["1", "1"],
        &["1", "2"],
        &["1", "1", "Shoprite Ikeja"],
        &["1", "1", "Shoprite Ikeja", "Magodo Phase 2"],
        &["1", "1", "Shoprite Ikeja", "Magodo Phase 2", "2 bags of groceries"],
        &[
            "1",
            "1",
            "Shoprite Ikeja",
            "Magodo Phase 2",
            "2 bags of groceries",
            "2500",
        ],
    ];

    for walk in walks {
        let (state, _dispatch_rx, _inbound_rx) = AppState::new(8, 8);
        for step in *walk {
            let _ = send(&state, &sender, CLIENT, step).await;
        }

        let reply = send(&state, &sender, CLIENT, "cancel").await.unwrap();
        assert!(reply.contains("cancelled"));

        let session = state.sessions.get(CLIENT).unwrap();
        assert!(session.is_idle());
        assert!(session.draft.is_empty());
        assert!(state.orders.is_empty());
    }
}

#[tokio::test]
async fn fan_out_offers_to_every_runner_and_sets_pointers() {
    let (state, _dispatch_rx, _inbound_rx) = AppState::new(8, 8);
    let sender = RecordingSender::default();

    for (phone, name) in [("2348020000001", "Bola"), ("2348020000002", "Chidi")] {
        register_runner(&state, phone, name).unwrap();
    }
    seed_order(&state, "ORD700001", OrderStatus::Pending, None);
    let order = state.orders.get("ORD700001").unwrap().clone();

    let outcome = fan_out_offer(&state, &sender, &order).await;
    assert_eq!(outcome, "complete");

    for phone in ["2348020000001", "2348020000002"] {
        let offers = sender.sent_to(phone);
        assert_eq!(offers.len(), 1);
        assert!(offers[0].contains("ORD700001"));

        let profile = state.profiles.get(phone).unwrap();
        assert_eq!(profile.last_offered_order.as_deref(), Some("ORD700001"));
    }
}

#[tokio::test]
async fn fan_out_continues_past_an_unreachable_runner() {
    let (state, _dispatch_rx, _inbound_rx) = AppState::new(8, 8);
    let sender = RecordingSender::default();
    sender.fail_for("2348020000002");

    for (phone, name) in [
        ("2348020000001", "Bola"),
        ("2348020000002", "Chidi"),
        ("2348020000003", "Dayo"),
    ] {
        register_runner(&state, phone, name).unwrap();
    }
    seed_order(&state, "ORD700002", OrderStatus::Pending, None);
    let order = state.orders.get("ORD700002").unwrap().clone();

    let outcome = fan_out_offer(&state, &sender, &order).await;
    assert_eq!(outcome, "partial");

    assert_eq!(sender.sent_to("2348020000001").len(), 1);
    assert!(sender.sent_to("2348020000002").is_empty());
    assert_eq!(sender.sent_to("2348020000003").len(), 1);

    // The unreachable runner still holds the pointer; a late `yes` may
    // resolve against it.
    let unreachable = state.profiles.get("2348020000002").unwrap();
    assert_eq!(unreachable.last_offered_order.as_deref(), Some("ORD700002"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_claims_have_exactly_one_winner() {
    let (state, _dispatch_rx, _inbound_rx) = AppState::new(8, 8);
    let shared = Arc::new(state);
    let sender = Arc::new(RecordingSender::default());

    let phones: Vec<String> = (0..8).map(|i| format!("23480200000{i:02}")).collect();
    for phone in &phones {
        register_runner(&shared, phone, "Runner").unwrap();
    }
    seed_order(&shared, "ORD700003", OrderStatus::Pending, None);
    let order = shared.orders.get("ORD700003").unwrap().clone();
    fan_out_offer(&shared, sender.as_ref(), &order).await;

    let barrier = Arc::new(Barrier::new(phones.len()));
    let mut handles = Vec::new();
    for phone in &phones {
        let state = shared.clone();
        let sender = sender.clone();
        let barrier = barrier.clone();
        let phone = phone.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            lifecycle::claim(&state, sender.as_ref(), &phone, ClaimTarget::LastOffered)
                .await
                .unwrap()
                .unwrap()
        }));
    }

    let mut wins = 0;
    let mut losses = 0;
    for handle in handles {
        let reply = handle.await.unwrap();
        if reply.contains("You have claimed") {
            wins += 1;
        } else {
            assert!(reply.contains("no longer available"));
            losses += 1;
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(losses, 7);

    let order = shared.orders.get("ORD700003").unwrap();
    assert_eq!(order.status, OrderStatus::Claimed);
    let winner = order.runner_phone.clone().unwrap();
    assert!(phones.contains(&winner));

    for phone in &phones {
        let profile = shared.profiles.get(phone).unwrap();
        assert!(profile.last_offered_order.is_none());
    }
}

#[tokio::test]
async fn late_yes_gets_unavailable_and_loses_the_pointer() {
    let (state, _dispatch_rx, _inbound_rx) = AppState::new(8, 8);
    let sender = RecordingSender::default();

    register_runner(&state, "2348020000001", "Bola").unwrap();
    register_runner(&state, "2348020000002", "Chidi").unwrap();
    seed_order(&state, "ORD700004", OrderStatus::Pending, None);
    let order = state.orders.get("ORD700004").unwrap().clone();
    fan_out_offer(&state, &sender, &order).await;

    let winner_reply = send(&state, &sender, "2348020000001", "yes").await.unwrap();
    assert!(winner_reply.contains("You have claimed"));

    let loser_reply = send(&state, &sender, "2348020000002", "yes").await.unwrap();
    assert!(loser_reply.contains("no open offer") || loser_reply.contains("no longer available"));

    let loser = state.profiles.get("2348020000002").unwrap();
    assert!(loser.last_offered_order.is_none());
}

#[tokio::test]
async fn explicit_claim_by_id_works_case_insensitively() {
    let (state, _dispatch_rx, _inbound_rx) = AppState::new(8, 8);
    let sender = RecordingSender::default();

    register_runner(&state, "2348020000001", "Bola").unwrap();
    seed_order(&state, "ORD700005", OrderStatus::Pending, None);

    let reply = send(&state, &sender, "2348020000001", "Claim ord700005")
        .await
        .unwrap();
    assert!(reply.contains("You have claimed"));

    let order = state.orders.get("ORD700005").unwrap();
    assert_eq!(order.status, OrderStatus::Claimed);
}

#[tokio::test]
async fn claim_commits_even_when_the_client_is_unreachable() {
    let (state, _dispatch_rx, _inbound_rx) = AppState::new(8, 8);
    let sender = RecordingSender::default();
    sender.fail_for(CLIENT);

    register_runner(&state, "2348020000001", "Bola").unwrap();
    seed_order(&state, "ORD700006", OrderStatus::Pending, None);

    let reply = send(&state, &sender, "2348020000001", "claim ORD700006")
        .await
        .unwrap();
    assert!(reply.contains("You have claimed"));
    assert!(reply.contains("couldn't notify"));

    let order = state.orders.get("ORD700006").unwrap();
    assert_eq!(order.status, OrderStatus::Claimed);
}

#[tokio::test]
async fn pickup_then_delivery_updates_both_parties() {
    let (state, _dispatch_rx, _inbound_rx) = AppState::new(8, 8);
    let sender = RecordingSender::default();
    let runner = "2348020000001";

    register_runner(&state, runner, "Bola").unwrap();
    seed_order(&state, "ORD700007", OrderStatus::Claimed, Some(runner));

    let reply = send(&state, &sender, runner, "pickup").await.unwrap();
    assert!(reply.contains("Pickup confirmed"));
    {
        let order = state.orders.get("ORD700007").unwrap();
        assert_eq!(order.status, OrderStatus::PickedUp);
        assert!(order.pickup_time.is_some());
    }
    assert!(sender
        .sent_to(CLIENT)
        .iter()
        .any(|text| text.contains("on its way")));

    let reply = send(&state, &sender, runner, "delivered").await.unwrap();
    assert!(reply.contains("Delivery confirmed"));
    {
        let order = state.orders.get("ORD700007").unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.delivery_time.is_some());
        assert!(order.delivery_time.unwrap() >= order.pickup_time.unwrap());
    }
    assert!(sender
        .sent_to(CLIENT)
        .iter()
        .any(|text| text.contains("delivered in")));
}

#[tokio::test]
async fn pickup_with_nothing_claimed_mutates_nothing() {
    let (state, _dispatch_rx, _inbound_rx) = AppState::new(8, 8);
    let sender = RecordingSender::default();

    register_runner(&state, "2348020000001", "Bola").unwrap();
    seed_order(&state, "ORD700008", OrderStatus::Pending, None);

    let reply = send(&state, &sender, "2348020000001", "pickup").await.unwrap();
    assert!(reply.contains("no claimed order"));

    let order = state.orders.get("ORD700008").unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.pickup_time.is_none());
}

#[tokio::test]
async fn delivered_without_a_pickup_is_rejected() {
    let (state, _dispatch_rx, _inbound_rx) = AppState::new(8, 8);
    let sender = RecordingSender::default();
    let runner = "2348020000001";

    register_runner(&state, runner, "Bola").unwrap();
    seed_order(&state, "ORD700009", OrderStatus::Claimed, Some(runner));

    let reply = send(&state, &sender, runner, "delivered").await.unwrap();
    assert!(reply.contains("no picked-up order"));

    let order = state.orders.get("ORD700009").unwrap();
    assert_eq!(order.status, OrderStatus::Claimed);
}

#[tokio::test]
async fn whole_flow_runs_through_both_engines() {
    let (state, dispatch_rx, inbound_rx) = AppState::new(64, 64);
    let shared = Arc::new(state);
    let sender = Arc::new(RecordingSender::default());

    tokio::spawn(router::run_message_engine(
        shared.clone(),
        sender.clone(),
        inbound_rx,
    ));
    tokio::spawn(dispatch::run_dispatch_engine(
        shared.clone(),
        sender.clone(),
        dispatch_rx,
    ));

    let runner = "2348020000001";
    register_runner(&shared, runner, "Bola").unwrap();

    for text in [
        "hi",
        "1",
        "2",
        "Shoprite Ikeja",
        "Magodo Phase 2",
        "2 bags of groceries",
        "2500",
        "confirm",
    ] {
        shared.inbound_tx.send(inbound(CLIENT, text)).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(sender
        .sent_to(CLIENT)
        .iter()
        .any(|text| text.contains("created!")));
    assert!(sender
        .sent_to(runner)
        .iter()
        .any(|text| text.contains("New Order Available")));

    shared.inbound_tx.send(inbound(runner, "yes")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(sender
        .sent_to(runner)
        .iter()
        .any(|text| text.contains("You have claimed")));
    assert!(sender
        .sent_to(CLIENT)
        .iter()
        .any(|text| text.contains("claimed by a runner")));

    shared.inbound_tx.send(inbound(runner, "pickup")).await.unwrap();
    shared
        .inbound_tx
        .send(inbound(runner, "delivered"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let order = shared.orders.iter().next().unwrap().value().clone();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert!(order.pickup_time.is_some());
    assert!(order.delivery_time.is_some());
    assert!(sender
        .sent_to(CLIENT)
        .iter()
        .any(|text| text.contains("delivered in")));
}

#[tokio::test]
async fn engine_ignores_own_messages_and_survives_errors() {
    let (state, dispatch_rx, inbound_rx) = AppState::new(4, 4);
    // Closing the dispatch side makes order creation fail downstream.
    drop(dispatch_rx);

    let shared = Arc::new(state);
    let sender = Arc::new(RecordingSender::default());
    tokio::spawn(router::run_message_engine(
        shared.clone(),
        sender.clone(),
        inbound_rx,
    ));

    let mut own = inbound(CLIENT, "hi");
    own.from_self = true;
    shared.inbound_tx.send(own).await.unwrap();

    shared
        .inbound_tx
        .send(inbound(
            CLIENT,
            "New Order | Shoprite Ikeja | Magodo Phase 2 | 2 bags | 2500",
        ))
        .await
        .unwrap();
    shared.inbound_tx.send(inbound(CLIENT, "hi")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let messages = sender.sent_to(CLIENT);
    assert!(messages
        .iter()
        .any(|text| text.contains("error processing your message")));
    assert!(messages
        .iter()
        .any(|text| text.contains("Welcome to QuickRun")));
    // The self-flagged greeting got no reply: one apology, one menu.
    assert_eq!(messages.len(), 2);
}

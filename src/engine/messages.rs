//! Every piece of text the bot sends, in the WhatsApp `*bold*` house style.

use crate::models::order::Order;

pub fn menu() -> String {
    "👋 Welcome to QuickRun!\n\n\
     What would you like to do?\n\n\
     1️⃣ Request an errand\n\
     2️⃣ How QuickRun works\n\n\
     Reply with a number. You can type *cancel* at any time to start over."
        .to_string()
}

pub fn help() -> String {
    "🆘 *QuickRun Help*\n\n\
     *Guided order:* type *hi* and follow the menu.\n\n\
     *One-shot order:*\n\
     New Order | Pickup | Delivery | Description | Price\n\
     Example: New Order | Shoprite Ikeja | Magodo Phase 2 | 2 bags of groceries | 2500\n\n\
     *For runners:*\n\
     Reply *yes* (or *claim <order id>*) to take an offer,\n\
     *pickup* once you have the package, *delivered* when it's done.\n\n\
     Need more help? Contact our support."
        .to_string()
}

pub fn ask_errand_type() -> String {
    "What kind of errand is this?\n\n\
     1️⃣ Pick up & deliver a package\n\
     2️⃣ Purchase & deliver from a store\n\n\
     Reply *1* or *2*."
        .to_string()
}

pub fn invalid_errand_type() -> String {
    "⚠️ Please reply *1* (pick up & deliver) or *2* (purchase & deliver), or type *cancel*."
        .to_string()
}

pub fn ask_pickup() -> String {
    "📍 Where should the runner pick up? Send the pickup address.".to_string()
}

pub fn ask_store() -> String {
    "🏬 Which store should the runner buy from? Send the store name and area.".to_string()
}

pub fn bad_location() -> String {
    "⚠️ That doesn't look like a valid location. Please send between 3 and 100 characters."
        .to_string()
}

pub fn ask_delivery() -> String {
    "📍 Where should it be delivered? Send the drop-off address.".to_string()
}

pub fn same_location() -> String {
    "⚠️ The drop-off must be different from the pickup. Please send another address.".to_string()
}

pub fn ask_description() -> String {
    "📝 What is the runner carrying or buying? Describe the item(s).".to_string()
}

pub fn bad_description() -> String {
    "⚠️ Please describe the item(s) in 3 to 200 characters.".to_string()
}

pub fn ask_price() -> String {
    "💰 What is the item worth in naira? Send a number between ₦500 and ₦50000.".to_string()
}

pub fn price_not_numeric() -> String {
    "⚠️ I need a number for the item price, e.g. *2500*.".to_string()
}

pub fn price_out_of_range() -> String {
    "⚠️ The item price must be between ₦500 and ₦50000.".to_string()
}

pub fn summary(
    pickup: &str,
    delivery: &str,
    description: &str,
    item_price: u32,
    delivery_fee: u32,
    total_price: u32,
) -> String {
    format!(
        "📦 Here's your errand:\n\n\
         📍 *Pickup:* {pickup}\n\
         📍 *Drop-off:* {delivery}\n\
         📝 *Items:* {description}\n\
         💰 *Item price:* ₦{item_price}\n\
         🛵 *Delivery fee:* ₦{delivery_fee}\n\
         💵 *Total:* ₦{total_price}\n\n\
         Reply *confirm* to post it to our runners, or *cancel* to discard."
    )
}

pub fn confirm_reprompt() -> String {
    "Reply *confirm* to post this errand, or *cancel* to discard it.".to_string()
}

pub fn order_created(order: &Order) -> String {
    format!(
        "✅ Order *{}* created!\n\n\
         📍 *Pickup:* {}\n\
         📍 *Drop-off:* {}\n\
         💵 *Total:* ₦{}\n\n\
         *Available runners will be notified shortly.*",
        order.order_id, order.pickup_location, order.delivery_location, order.total_price
    )
}

pub fn cancelled() -> String {
    "❌ Errand cancelled. Type *hi* whenever you need a runner.".to_string()
}

pub fn offer(order: &Order) -> String {
    format!(
        "🚀 *New Order Available!*\n\n\
         🆔 *Order:* {}\n\
         📍 *Pickup:* {}\n\
         📍 *Drop-off:* {}\n\
         📝 *Items:* {}\n\
         🛵 *Delivery fee:* ₦{}\n\n\
         Reply *yes* or *claim {}* to take this errand.",
        order.order_id,
        order.pickup_location,
        order.delivery_location,
        order.description,
        order.delivery_fee,
        order.order_id
    )
}

pub fn claimed_runner(order: &Order) -> String {
    format!(
        "✅ You have claimed Order *{}*.\n\n\
         📍 *Pickup:* {}\n\
         📍 *Drop-off:* {}\n\n\
         Contact the client at: +{}.",
        order.order_id, order.pickup_location, order.delivery_location, order.client_phone
    )
}

pub fn claimed_client(order: &Order) -> String {
    format!(
        "🚀 Your order *{}* has been claimed by a runner. Expect a call soon.",
        order.order_id
    )
}

pub fn order_unavailable() -> String {
    "⚠️ This order is no longer available or does not exist.".to_string()
}

pub fn no_offer() -> String {
    "⚠️ There's no open offer waiting for your reply. New orders will arrive here.".to_string()
}

pub fn claim_usage() -> String {
    "Usage: *claim <order id>*, or reply *yes* to the latest offer.".to_string()
}

pub fn picked_up_runner(order: &Order) -> String {
    format!(
        "✅ Pickup confirmed for Order *{}*. Safe travels!",
        order.order_id
    )
}

pub fn picked_up_client(order: &Order) -> String {
    format!(
        "📦 Your order *{}* has been picked up and is on its way!",
        order.order_id
    )
}

pub fn nothing_to_pickup() -> String {
    "⚠️ You have no claimed order to pick up.".to_string()
}

pub fn delivered_runner(order: &Order, duration: &str) -> String {
    format!(
        "✅ Delivery confirmed for Order *{}* — completed in {}. Great job!",
        order.order_id, duration
    )
}

pub fn delivered_client(order: &Order, duration: &str) -> String {
    format!(
        "🎉 Your order *{}* was delivered in {}. Thanks for using QuickRun!",
        order.order_id, duration
    )
}

pub fn nothing_to_deliver() -> String {
    "⚠️ You have no picked-up order to deliver.".to_string()
}

pub fn notify_failure_note() -> String {
    "\n\n⚠️ We couldn't notify the other party just now — please reach out to them directly."
        .to_string()
}

pub fn invalid_shorthand() -> String {
    "⚠️ Invalid format! Use: *New Order | Pickup | Delivery | Description | Price*".to_string()
}

pub fn apology() -> String {
    "❌ Sorry, there was an error processing your message. Please try again.".to_string()
}

pub fn fmt_duration(minutes: i64) -> String {
    match minutes {
        m if m < 1 => "under a minute".to_string(),
        1 => "1 minute".to_string(),
        m => format!("{m} minutes"),
    }
}

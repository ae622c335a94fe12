/// Minimum delivery fee in naira, charged whatever the tier says.
pub const BASE_FEE: u32 = 200;
/// Ceiling on the top tier's 10% fee.
pub const FEE_CAP: u32 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub delivery_fee: u32,
    pub total_price: u32,
}

/// Tiered delivery fee in whole naira. Bounds checking on `item_price`
/// belongs to the caller; this function prices whatever it is given.
pub fn compute_fee(item_price: u32) -> FeeQuote {
    let delivery_fee = if item_price <= 1_000 {
        (item_price * 25 / 100).max(BASE_FEE)
    } else if item_price <= 5_000 {
        (item_price * 20 / 100).max(BASE_FEE)
    } else if item_price <= 10_000 {
        (item_price * 15 / 100).max(BASE_FEE)
    } else {
        (item_price * 10 / 100).max(BASE_FEE).min(FEE_CAP)
    };

    FeeQuote {
        delivery_fee,
        total_price: item_price + delivery_fee,
    }
}

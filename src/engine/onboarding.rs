use tracing::info;

use crate::error::AppError;
use crate::models::profile::UserProfile;
use crate::state::AppState;

/// Register a runner under their normalized phone identity. Phones are
/// stored digits-only; the vacant-entry insert enforces uniqueness.
pub fn register_runner(
    state: &AppState,
    raw_phone: &str,
    name: &str,
) -> Result<UserProfile, AppError> {
    let phone = normalize_phone(raw_phone)?;

    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }

    let profile = match state.profiles.entry(phone.clone()) {
        dashmap::mapref::entry::Entry::Occupied(_) => {
            return Err(AppError::Conflict(format!(
                "runner {phone} is already registered"
            )));
        }
        dashmap::mapref::entry::Entry::Vacant(slot) => {
            slot.insert(UserProfile::runner(&phone, name)).clone()
        }
    };

    info!(phone = %profile.phone, name = %profile.name, "runner registered");
    Ok(profile)
}

fn normalize_phone(raw: &str) -> Result<String, AppError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if !(10..=15).contains(&digits.len()) {
        return Err(AppError::Validation(
            "phone must contain 10 to 15 digits".to_string(),
        ));
    }
    Ok(digits)
}

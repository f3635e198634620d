use std::sync::OnceLock;
use std::time::Instant;

use regex::Regex;

use crate::error::AppError;
use crate::tools::builtin::CALL_PHONE_NUMBER;
use crate::tools::dialer::Dialer;

const DIALER_APP: &str = "FaceTime";
const MIN_LEN: usize = 5;
const MAX_LEN: usize = 16;

fn non_digits() -> &'static Regex {
    static RX: OnceLock<Regex> = OnceLock::new();
    RX.get_or_init(|| Regex::new(r"\D").expect("static regex"))
}

/// Strips formatting and adds a country code for North American numbers.
/// A `+` survives only in leading position.
pub fn normalize_phone_number(raw: &str) -> String {
    let trimmed = raw.trim();
    let digits = non_digits().replace_all(trimmed, "").into_owned();
    if trimmed.starts_with('+') {
        return format!("+{digits}");
    }
    match digits.len() {
        11 if digits.starts_with('1') => format!("+{digits}"),
        10 => format!("+1{digits}"),
        n if n > 10 => format!("+{digits}"),
        _ => digits,
    }
}

/// Runs the dial cascade. A fallback step only starts before `deadline`, so no
/// attempt begins after the caller has given up on the call.
pub fn place_call(
    dialer: &dyn Dialer,
    phone_number: &str,
    contact_name: Option<&str>,
    deadline: Instant,
) -> Result<String, AppError> {
    let number = normalize_phone_number(phone_number);
    if number.len() < MIN_LEN || number.len() > MAX_LEN {
        return Err(AppError::ToolArgumentInvalid {
            tool: CALL_PHONE_NUMBER.to_string(),
            reason: format!("invalid phone number format: {phone_number} (too short or too long)"),
        });
    }

    let display = contact_name.map(|n| format!(" ({n})")).unwrap_or_default();
    let tel_uri = format!("tel:{number}");

    tracing::info!(number = %number, "opening tel: URI");
    if dialer.open(&tel_uri) {
        return Ok(format!(
            "Calling {phone_number}{display}... Call initiated successfully. FaceTime or your default phone app should open."
        ));
    }

    ensure_time_left(deadline, phone_number)?;
    tracing::warn!(number = %number, "tel: URI failed, opening it in {DIALER_APP}");
    if dialer.open_with(DIALER_APP, &tel_uri) {
        return Ok(format!(
            "Calling {phone_number}{display}... {DIALER_APP} opened successfully."
        ));
    }

    ensure_time_left(deadline, phone_number)?;
    tracing::warn!(number = %number, "{DIALER_APP} open location failed, activating app only");
    if dialer.activate_app(DIALER_APP) {
        return Ok(format!(
            "{DIALER_APP} app opened. Please call {phone_number}{display} manually (number: {number})."
        ));
    }

    tracing::error!(number = %number, "all call attempts failed");
    Err(AppError::ToolExecutionFailed(format!(
        "Unable to initiate call to {phone_number}. Please check if {DIALER_APP} is installed and try calling {number} manually."
    )))
}

fn ensure_time_left(deadline: Instant, phone_number: &str) -> Result<(), AppError> {
    if Instant::now() < deadline {
        return Ok(());
    }
    tracing::warn!(phone_number, "call time budget exhausted, skipping remaining attempts");
    Err(AppError::ToolExecutionFailed(format!(
        "Unable to initiate call to {phone_number} in time. Please try calling manually."
    )))
}

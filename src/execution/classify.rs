use anyhow::Error;

pub const CANCELLED_MESSAGE: &str = "Generation was cancelled";
pub const TIMEOUT_MESSAGE: &str =
    "Generation timed out. Check your history for the final result.";
pub const EMPTY_INPUT_MESSAGE: &str = "No input provided";

/// User-facing category of a submission or poll failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunErrorKind {
    AuthExpired,
    Network,
    InsufficientCredits,
    ModelUnavailable,
    Server,
}

/// Map a transport or server error to its user-facing category and
/// message. Runs once per failure; unrecognized server messages pass
/// through verbatim.
pub fn classify_error(err: &Error) -> (RunErrorKind, String) {
    if let Some(req_err) = err.downcast_ref::<reqwest::Error>()
        && (req_err.is_connect() || req_err.is_timeout())
    {
        return (
            RunErrorKind::Network,
            "Network unavailable. Check your connection and try again.".to_string(),
        );
    }

    let text = format!("{:#}", err);
    let lower = text.to_lowercase();

    if lower.contains("401") || lower.contains("unauthorized") || lower.contains("session expired")
    {
        (
            RunErrorKind::AuthExpired,
            "Your session has expired. Please sign in again.".to_string(),
        )
    } else if lower.contains("insufficient credit") {
        (
            RunErrorKind::InsufficientCredits,
            "Not enough credits to run this model.".to_string(),
        )
    } else if lower.contains("model not found")
        || lower.contains("not active")
        || lower.contains("deactivated")
    {
        (
            RunErrorKind::ModelUnavailable,
            "This model is currently unavailable.".to_string(),
        )
    } else {
        (RunErrorKind::Server, text)
    }
}

use formpilot_core::FillError;

/// Classify a page-evaluation failure. Context loss means the browsing
/// context is gone (navigation, tab closed) and the whole run must abort;
/// anything else is a phase-local script failure.
pub fn to_fill_error(e: impl std::fmt::Display, action: &str) -> FillError {
    let s = e.to_string();
    if s.contains("Cannot find context")
        || s.contains("Execution context was destroyed")
        || s.contains("Session closed")
        || s.contains("Target closed")
    {
        FillError::dispatch_error(format!("{} lost its page context: {}", action, s))
    } else if s.contains("timeout") || s.contains("Timeout") {
        FillError::timeout_error(format!("{} timed out: {}", action, s))
    } else {
        FillError::script_error(format!("{} failed: {}", action, s))
    }
}

pub mod detect;
pub mod dispatch;
pub mod relay;
pub mod runtime;
pub mod wait;

use serde_json::Value;

/// Wrap an arrow-function snippet into an immediately-invoked call with
/// JSON-serialized arguments.
pub fn build_js_call(func: &str, args: &[Value]) -> String {
    let args_str = args
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("({})({})", func, args_str)
}

/// Prefix a call with the page-side runtime and rule tables so it works in
/// contexts that were never bootstrapped (attach to an already-loaded page).
/// The runtime installs itself idempotently; the rule tables are reassigned
/// on every dispatch, which keeps them current and is harmless.
pub fn with_runtime(rules_json: &Value, call: &str) -> String {
    format!(
        "{};\nwindow.__formpilot.rules = {};\n{}",
        runtime::MATCHER_RUNTIME, rules_json, call
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_js_call_serializes_arguments() {
        let js = build_js_call("(a, b) => a + b", &[json!("x\"y"), json!(2)]);
        assert_eq!(js, "((a, b) => a + b)(\"x\\\"y\", 2)");
    }

    #[test]
    fn with_runtime_prepends_bootstrap_and_rules() {
        let js = with_runtime(&json!({"critical": []}), "(() => 1)()");
        assert!(js.starts_with("\n(() => {"));
        assert!(js.contains("window.__formpilot.rules = {\"critical\":[]}"));
        assert!(js.ends_with("(() => 1)()"));
    }
}

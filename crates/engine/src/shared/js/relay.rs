//! Cross-frame relay receiver. Installed into every frame (cross-origin
//! included) via `Page.addScriptToEvaluateOnNewDocument`, so it is the
//! engine's own listener, never the target page's. Messages from origins
//! outside the allow-list are discarded. Delivery is at-most-once and never
//! acknowledged; local failures stay local.

pub const RELAY_LISTENER: &str = r#"
(allowedOrigins) => {
    if (window.__formpilotRelay) return;
    window.__formpilotRelay = true;
    window.addEventListener('message', (event) => {
        if (!allowedOrigins.includes(event.origin)) return;
        const message = event.data || {};
        if (message.type !== 'FILL_IFRAME') return;
        const ns = window.__formpilot;
        if (!ns) return;
        try {
            ns.runPhase(document, {
                phase: message.phase,
                values: (message.profile && message.profile.values) || {},
                attachments: (message.profile && message.profile.attachments) || {},
                stagger: message.stagger || 50
            });
        } catch (e) {
            // fire-and-forget: nothing crosses back over the boundary
        }
    });
}
"#;

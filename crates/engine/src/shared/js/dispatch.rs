//! Per-phase broadcast across frame contexts, evaluated in the top frame.
//! The walk is recursive: same-origin frames are scripted directly through
//! `contentDocument` and their own sub-frames visited in turn; cross-origin
//! frames at any depth get the `FILL_IFRAME` wire message, fire-and-forget.
//! Context labels chain parent to child ("iframe:<src>>iframe:<src>").

pub const BROADCAST_PHASE: &str = r#"
(command) => {
    const ns = window.__formpilot;
    if (!ns) {
        return [{ context: 'top', success: false, error: 'matcher runtime not installed' }];
    }
    const results = [];
    const maxDepth = 5;
    const visit = (doc, label, depth) => {
        try {
            const outcome = ns.runPhase(doc, command);
            const entry = { context: label, success: true };
            if (outcome.notes && outcome.notes.length) entry.notes = outcome.notes;
            results.push(entry);
        } catch (e) {
            results.push({
                context: label,
                success: false,
                error: String((e && e.message) || e)
            });
            return;
        }
        if (depth >= maxDepth) return;
        doc.querySelectorAll('iframe').forEach((frame, index) => {
            const childLabel = (label === 'top' ? '' : label + '>') +
                'iframe:' + (frame.src || index);
            let childDoc = null;
            try { childDoc = frame.contentDocument; } catch (e) { childDoc = null; }
            if (childDoc) {
                visit(childDoc, childLabel, depth + 1);
            } else if (frame.contentWindow) {
                frame.contentWindow.postMessage(command.relay, '*');
                results.push({ context: childLabel, success: true, relayed: true });
            }
        });
    };
    visit(document, 'top', 0);
    return results;
}
"#;

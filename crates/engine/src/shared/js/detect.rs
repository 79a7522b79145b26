//! Read-only page introspection for platform detection. Classification of
//! the probe output happens on the Rust side (`crate::platform`).

pub const PROBE_PLATFORM: &str = r#"
(markers, prefixCap) => {
    const hits = {};
    for (const [name, selector] of Object.entries(markers)) {
        hits[name] = selector ? document.querySelector(selector) !== null : false;
    }
    return {
        url: window.location.href,
        markers: hits,
        htmlPrefix: document.documentElement.outerHTML.toLowerCase().substring(0, prefixCap)
    };
}
"#;

pub const ANALYZE_FORM: &str = r#"
() => {
    const analysis = { formCount: 0, visibleInputs: 0, fieldTypes: {}, actionHosts: [] };
    document.querySelectorAll('form').forEach((form) => {
        analysis.formCount++;
        if (form.action) {
            try {
                analysis.actionHosts.push(new URL(form.action, window.location.href).hostname);
            } catch (e) {}
        }
        form.querySelectorAll('input, textarea, select').forEach((input) => {
            if (input.offsetParent === null) return;
            analysis.visibleInputs++;
            const type = input.type ? input.type.toLowerCase() : input.tagName.toLowerCase();
            analysis.fieldTypes[type] = (analysis.fieldTypes[type] || 0) + 1;
        });
    });
    return analysis;
}
"#;

pub const IDENTIFY_CHALLENGES: &str = r#"
() => ({
    iframes: document.querySelectorAll('iframe').length > 0,
    cspMeta: document.querySelector('meta[http-equiv="Content-Security-Policy"]') !== null,
    dynamicIndicators: document.querySelectorAll('.loading, .spinner, [aria-busy="true"]').length > 0,
    pdfOnlyUploads: document.querySelector('input[type="file"][accept*="pdf"]') !== null &&
        document.querySelector('input[type="file"][accept*="doc"]') === null,
    captcha: document.querySelector(
        'div.g-recaptcha, div.h-captcha, iframe[src*="recaptcha"], iframe[src*="hcaptcha"]') !== null
})
"#;

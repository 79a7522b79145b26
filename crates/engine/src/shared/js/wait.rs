pub const CHECK_PROCESSING: &str = r#"
(selectors) => selectors.some((selector) => {
    const el = document.querySelector(selector);
    return el !== null && el.offsetParent !== null;
})
"#;

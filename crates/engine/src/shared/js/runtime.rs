//! The page-side matcher runtime. Installed idempotently into every frame
//! (via the relay bootstrap) and prepended to every dispatch, it exposes one
//! generic rule-driven matching algorithm plus the file and consent
//! handlers under `window.__formpilot`.

pub const MATCHER_RUNTIME: &str = r#"
(() => {
    if (window.__formpilot) return;
    const ns = {};

    ns.isVisible = (el) => el.offsetParent !== null;

    ns.triggerEvents = (el, stagger) => {
        const events = ['focus', 'input', 'change', 'blur', 'keyup'];
        events.forEach((type, index) => {
            setTimeout(() => {
                el.dispatchEvent(new Event(type, { bubbles: true, cancelable: true }));
            }, index * stagger);
        });
    };

    ns.fieldContext = (el) => {
        let context = (el.id || '') + ' ' + (el.name || '') + ' ' +
            (el.placeholder || '') + ' ' + (el.getAttribute('aria-label') || '');
        const doc = el.ownerDocument;
        const label = el.labels && el.labels.length > 0
            ? el.labels[0]
            : (el.id ? doc.querySelector('label[for="' + el.id + '"]') : null);
        if (label) context += ' ' + label.textContent;
        let parent = el.parentElement;
        let depth = 0;
        while (parent && depth < 3) {
            if (parent.classList.contains('form-group') ||
                parent.classList.contains('field') ||
                parent.classList.contains('form-field')) {
                parent.querySelectorAll('label, .label, .title, h1, h2, h3, h4, span')
                    .forEach((node) => {
                        if (node.offsetParent !== null && node.textContent.length < 100) {
                            context += ' ' + node.textContent;
                        }
                    });
            }
            parent = parent.parentElement;
            depth++;
        }
        return context.replace(/\s+/g, ' ').trim();
    };

    ns.contextMatches = (el, keywords) => {
        if (!keywords || keywords.length === 0) return true;
        const context = ns.fieldContext(el).toLowerCase();
        return keywords.some((kw) => context.includes(kw));
    };

    ns.writeValue = (el, value, stagger) => {
        if (el.disabled || el.readOnly) return false;
        if (el.value === value) return false;
        el.focus();
        el.value = '';
        el.dispatchEvent(new Event('input', { bubbles: true }));
        el.value = value;
        ns.triggerEvents(el, stagger);
        return true;
    };

    ns.selectOption = (el, desired, stagger) => {
        if (el.disabled) return false;
        const wanted = desired.trim().toLowerCase();
        const options = Array.from(el.options);
        let match = options.find((o) =>
            o.text.trim().toLowerCase() === wanted || o.value.toLowerCase() === wanted);
        if (!match) {
            match = options.find((o) => o.text.trim().toLowerCase().includes(wanted));
        }
        if (!match) return false;
        if (el.value === match.value) return false;
        el.value = match.value;
        ns.triggerEvents(el, stagger);
        return true;
    };

    ns.applyRules = (doc, rules, values, stagger) => {
        rules.forEach((rule) => {
            const value = values[rule.key];
            if (!value) return;
            rule.selectors.forEach((selector) => {
                doc.querySelectorAll(selector).forEach((el) => {
                    if (!ns.isVisible(el) || el.disabled) return;
                    if (!ns.contextMatches(el, rule.contextKeywords)) return;
                    const isSelect = el.tagName.toLowerCase() === 'select';
                    if (rule.kind === 'select') {
                        if (isSelect) ns.selectOption(el, value, stagger);
                    } else if (!isSelect) {
                        ns.writeValue(el, value, stagger);
                    }
                });
            });
        });
    };

    ns.handleConsent = (doc, consent, stagger) => {
        consent.selectors.forEach((selector) => {
            doc.querySelectorAll(selector).forEach((box) => {
                if (box.checked || box.disabled || !ns.isVisible(box)) return;
                const context = ns.fieldContext(box).toLowerCase();
                const wanted = consent.keywords.some((kw) => context.includes(kw));
                const optOut = consent.optOutKeywords.some((kw) => context.includes(kw));
                if (wanted && !optOut) {
                    box.checked = true;
                    ns.triggerEvents(box, stagger);
                }
            });
        });
    };

    ns.decodeAttachment = (attachment) => {
        const binary = atob(attachment.payload);
        const bytes = new Uint8Array(binary.length);
        for (let i = 0; i < binary.length; i++) bytes[i] = binary.charCodeAt(i);
        return new File([bytes], attachment.name, { type: attachment.mimeType });
    };

    ns.classifyFileInput = (input, keywordTable) => {
        const context = ns.fieldContext(input).toLowerCase();
        for (const entry of keywordTable) {
            if (entry.keywords.some((kw) => context.includes(kw))) return entry.slot;
        }
        return 'unknown';
    };

    ns.uploadFiles = (doc, attachments, keywordTable, stagger) => {
        const notes = [];
        doc.querySelectorAll('input[type="file"]').forEach((input) => {
            if (input.disabled || !ns.isVisible(input)) return;
            const slot = ns.classifyFileInput(input, keywordTable);
            const attachment = attachments[slot];
            if (!attachment) return;
            try {
                const file = ns.decodeAttachment(attachment);
                const transfer = new DataTransfer();
                transfer.items.add(file);
                input.files = transfer.files;
                ns.triggerEvents(input, stagger);
            } catch (e) {
                notes.push('file assignment failed for ' + attachment.name + ': ' +
                    String((e && e.message) || e));
            }
        });
        return notes;
    };

    ns.runPhase = (doc, command) => {
        const rules = ns.rules || {};
        const stagger = command.stagger || 50;
        const values = command.values || {};
        switch (command.phase) {
            case 'basic_info':
            case 'contact_details':
            case 'professional_info': {
                const table = rules[command.phase];
                if (!table) return { handled: false, notes: [] };
                ns.applyRules(doc, table, values, stagger);
                return { handled: true, notes: [] };
            }
            case 'consent_handling': {
                if (!rules.consent) return { handled: false, notes: [] };
                ns.handleConsent(doc, rules.consent, stagger);
                return { handled: true, notes: [] };
            }
            case 'file_uploads': {
                const notes = ns.uploadFiles(doc, command.attachments || {},
                    rules.fileKeywords || [], stagger);
                return { handled: true, notes: notes };
            }
            case 'validation_check': {
                if (!rules.critical) return { handled: false, notes: [] };
                ns.applyRules(doc, rules.critical, values, stagger);
                return { handled: true, notes: [] };
            }
            default:
                return { handled: false, notes: [] };
        }
    };

    window.__formpilot = ns;
})()
"#;

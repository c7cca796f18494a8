//! Selector-to-JavaScript compilation for DOM queries.
//!
//! Page interaction goes through `Runtime.evaluate` rather than CDP node
//! handles: provider pages rebuild their DOM between polls, and node handles
//! taken on one poll are routinely stale by the next. Each query compiles to
//! a self-contained IIFE that locates elements fresh and answers in JSON.
//!
//! Two selector forms are supported:
//! - plain CSS, passed to `querySelectorAll` as-is
//! - `tag:text('Needle')` (also `tag1,tag2:text('Needle')`), matching
//!   elements of the given tags whose visible text or value contains the
//!   needle, case-insensitively

/// Parsed selector target.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Css(String),
    Text { tags: Vec<String>, needle: String },
}

/// Parse a selector string into a [`Target`].
pub fn parse(selector: &str) -> Target {
    if let Some(idx) = selector.find(":text('") {
        let tags_part = &selector[..idx];
        let rest = &selector[idx + ":text('".len()..];
        if let Some(end) = rest.rfind("')") {
            let needle = &rest[..end];
            let tags = tags_part
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>();
            if !tags.is_empty() {
                return Target::Text {
                    tags,
                    needle: needle.to_string(),
                };
            }
        }
    }
    Target::Css(selector.to_string())
}

/// Shared JS helpers: visibility test, text normalization, element scan.
fn prelude(target: &Target) -> String {
    let matcher = match target {
        Target::Css(css) => format!(
            "const els = Array.from(document.querySelectorAll({}));",
            js_str(css)
        ),
        Target::Text { tags, needle } => format!(
            "const needle = {}.toLowerCase();\n\
             const els = Array.from(document.querySelectorAll({}))\n\
               .filter(el => norm(el.innerText || el.value || '').includes(needle));",
            js_str(needle),
            js_str(&tags.join(","))
        ),
    };

    format!(
        "function isVisible(el) {{\n\
           if (!el || !el.getBoundingClientRect) return false;\n\
           const r = el.getBoundingClientRect();\n\
           return r.width > 0 && r.height > 0;\n\
         }}\n\
         function norm(s) {{ return String(s || '').trim().toLowerCase(); }}\n\
         {matcher}"
    )
}

/// JS returning `{found, visible}` for the selector.
pub fn probe_js(selector: &str) -> String {
    let target = parse(selector);
    format!(
        "(function() {{\n{}\nreturn {{ found: els.length > 0, visible: els.some(isVisible) }};\n}})()",
        prelude(&target)
    )
}

/// JS clicking the first visible match, returning true if one was clicked.
pub fn click_js(selector: &str) -> String {
    let target = parse(selector);
    format!(
        "(function() {{\n{}\n\
         for (const el of els) {{\n\
           if (!isVisible(el)) continue;\n\
           try {{ el.click(); return true; }} catch (_) {{}}\n\
         }}\n\
         return false;\n}})()",
        prelude(&target)
    )
}

/// JS filling the first visible match and firing input/change events,
/// returning true if an element was filled.
pub fn fill_js(selector: &str, text: &str) -> String {
    let target = parse(selector);
    format!(
        "(function() {{\n{}\n\
         function fire(el, type) {{\n\
           try {{ el.dispatchEvent(new Event(type, {{ bubbles: true }})); }} catch (_) {{}}\n\
         }}\n\
         for (const el of els) {{\n\
           if (!isVisible(el)) continue;\n\
           try {{ el.focus(); }} catch (_) {{}}\n\
           el.value = {};\n\
           fire(el, 'input');\n\
           fire(el, 'change');\n\
           return true;\n\
         }}\n\
         return false;\n}})()",
        prelude(&target),
        js_str(text)
    )
}

/// JS counting all matches (visible or not, mirroring locator counts).
pub fn count_js(selector: &str) -> String {
    let target = parse(selector);
    format!(
        "(function() {{\n{}\nreturn els.length;\n}})()",
        prelude(&target)
    )
}

/// Quote a Rust string as a JS string literal.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

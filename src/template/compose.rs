//! Template composition and context substitution.
//!
//! The page-decoration preamble carries the page geometry and the three
//! decorative-image placeholders. It is prepended to every user template, so
//! the injected context keys satisfy its placeholders the same way user
//! fields satisfy the body's.

use lazy_static::lazy_static;
use regex::{Captures, NoExpand, Regex};
use serde_json::{Map, Value};

/// Fixed structural fragment prepended to every template body.
pub const PAGE_DECORATION: &str = r#"<style>
@page {
    size: A4;
    margin: 110px 70px 70px 70px;

    @top-left {
        content: url('{{ header_image_url }}');
        margin-left: -110px;
        margin-top: -25px;
    }

    @bottom-center {
        content: url('{{ footer_image_url }}');
    }
}
.watermark {
    position: fixed;
    top: -400px;
    left: -227px;
    width: 25.4cm;
    height: 39.7cm;
    opacity: 0.9;
    z-index: -1;
    background-size: contain;
    background-repeat: no-repeat;
    background-position: center;
    pointer-events: none;
}
</style>
<div class="watermark" style="background-image: url('{{ watermark_url }}');"></div>
"#;

lazy_static! {
    static ref SCALAR_RE: Regex = Regex::new(r"\{\{\s*([^\s{}]+)\s*\}\}").expect("scalar pattern");
    static ref LOOP_BLOCK_RE: Regex =
        Regex::new(r"(?s)\{%\s*for\s+(\S+)\s+in\s+([^\s%}]+)\s*%\}(.*?)\{%\s*endfor\s*%\}")
            .expect("loop block pattern");
}

/// Prepend the page decoration (and the template's stored CSS, if any) to
/// the user HTML, then substitute the context over the combined text.
pub fn compose(user_html: &str, css: Option<&str>, context: &Map<String, Value>) -> String {
    let mut combined = String::from(PAGE_DECORATION);
    if let Some(css) = css {
        if !css.trim().is_empty() {
            combined.push_str("<style>\n");
            combined.push_str(css);
            combined.push_str("\n</style>\n");
        }
    }
    combined.push_str(user_html);
    substitute(&combined, context)
}

/// Loop blocks expand first so their bodies keep outer placeholders intact
/// for the scalar pass.
pub fn substitute(template: &str, context: &Map<String, Value>) -> String {
    let expanded = expand_loops(template, context);
    replace_scalars(&expanded, context)
}

fn expand_loops(template: &str, context: &Map<String, Value>) -> String {
    LOOP_BLOCK_RE
        .replace_all(template, |caps: &Captures| {
            let var = &caps[1];
            let body = &caps[3];
            let items = match context.get(&caps[2]) {
                Some(Value::Array(items)) => items,
                _ => return String::new(),
            };
            let var_re = match Regex::new(&format!(r"\{{\{{\s*{}\s*\}}\}}", regex::escape(var))) {
                Ok(re) => re,
                Err(_) => return String::new(),
            };
            let mut rendered = String::new();
            for item in items {
                let text = scalar_text(item);
                rendered.push_str(&var_re.replace_all(body, NoExpand(text.as_str())));
            }
            rendered
        })
        .into_owned()
}

fn replace_scalars(template: &str, context: &Map<String, Value>) -> String {
    SCALAR_RE
        .replace_all(template, |caps: &Captures| match context.get(&caps[1]) {
            Some(value) => scalar_text(value),
            None => String::new(),
        })
        .into_owned()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

//! Placeholder discovery in template HTML.
//!
//! Templates embed two placeholder syntaxes: a scalar marker `{{ name }}`
//! and a loop marker `{% for var in name %}`. Discovery is a single
//! left-to-right scan over both; a missed or misclassified name breaks form
//! generation downstream with no compile-time check, so the rules here are
//! deliberately narrow.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

pub const HEADER_IMAGE_FIELD: &str = "header_image_url";
pub const FOOTER_IMAGE_FIELD: &str = "footer_image_url";
pub const WATERMARK_FIELD: &str = "watermark_url";

/// Names injected by the generation pipeline; never user-entered.
pub const RESERVED_FIELDS: [&str; 3] = [HEADER_IMAGE_FIELD, FOOTER_IMAGE_FIELD, WATERMARK_FIELD];

/// Conventional implicit loop-item names, synthetic even when no loop in the
/// template binds them.
const LOOP_ITEM_NAMES: [&str; 3] = ["item", "line", "row"];

lazy_static! {
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"\{\{\s*([^\s{}]+)\s*\}\}|\{%\s*for\s+(\S+)\s+in\s+([^\s%}]+)\s*%\}")
            .expect("placeholder pattern");
    static ref LOOP_RE: Regex =
        Regex::new(r"\{%\s*for\s+(\S+)\s+in\s+([^\s%}]+)\s*%\}").expect("loop pattern");
}

/// Every distinct placeholder name in first-occurrence order.
///
/// Loop-bound variables are synthetic and skipped unless the same name also
/// appears as a loop source elsewhere (the loop reading wins).
pub fn extract_fields(html: &str) -> Vec<String> {
    let mut loop_vars: HashSet<&str> = HashSet::new();
    let mut loop_sources: HashSet<&str> = HashSet::new();
    for caps in LOOP_RE.captures_iter(html) {
        if let (Some(var), Some(source)) = (caps.get(1), caps.get(2)) {
            loop_vars.insert(var.as_str());
            loop_sources.insert(source.as_str());
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut fields = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(html) {
        let name = match caps.get(1).or_else(|| caps.get(3)) {
            Some(m) => m.as_str(),
            None => continue,
        };
        if RESERVED_FIELDS.contains(&name) {
            continue;
        }
        let synthetic = LOOP_ITEM_NAMES.contains(&name) || loop_vars.contains(name);
        if synthetic && !loop_sources.contains(name) {
            continue;
        }
        if seen.insert(name) {
            fields.push(name.to_string());
        }
    }
    fields
}

/// Names appearing as loop sources, distinct, in first-occurrence order.
///
/// This is the kind classifier: a name listed here is a list field even when
/// it also occurs as `{{ name }}`.
pub fn extract_list_fields(html: &str) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut sources = Vec::new();
    for caps in LOOP_RE.captures_iter(html) {
        let name = match caps.get(2) {
            Some(m) => m.as_str(),
            None => continue,
        };
        if seen.insert(name) {
            sources.push(name.to_string());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_order_without_duplicates() {
        let html = "{{ b }} {{ a }} {{ b }} {% for x in c %}{{ x }}{% endfor %} {{ a }}";
        assert_eq!(extract_fields(html), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_reserved_names_never_extracted() {
        let html = "{{ header_image_url }} {{ name }} {{ footer_image_url }} {{ watermark_url }}";
        assert_eq!(extract_fields(html), vec!["name"]);
    }

    #[test]
    fn test_loop_variable_is_not_a_field() {
        let html = "Hello {{name}}, items: {% for i in items %}{{i}}{% endfor %}";
        assert_eq!(extract_fields(html), vec!["name", "items"]);
        assert_eq!(extract_list_fields(html), vec!["items"]);
    }

    #[test]
    fn test_conventional_item_names_skipped_without_a_loop() {
        let html = "{{ item }} {{ line }} {{ row }} {{ total }}";
        assert_eq!(extract_fields(html), vec!["total"]);
    }

    #[test]
    fn test_scalar_inside_loop_body_stays_discovered() {
        let html = "{% for line in services %}{{ line }} - {{ currency }}{% endfor %}";
        assert_eq!(extract_fields(html), vec!["services", "currency"]);
        assert_eq!(extract_list_fields(html), vec!["services"]);
    }

    #[test]
    fn test_unicode_names_supported() {
        let html = "{{ localização }} {% for item in itens_não_inclusos %}{{ item }}{% endfor %}";
        assert_eq!(
            extract_fields(html),
            vec!["localização", "itens_não_inclusos"]
        );
        assert_eq!(extract_list_fields(html), vec!["itens_não_inclusos"]);
    }

    #[test]
    fn test_name_used_as_both_source_and_scalar_is_kept_once() {
        let html = "{% for x in notes %}{{ x }}{% endfor %} total: {{ notes }}";
        assert_eq!(extract_fields(html), vec!["notes"]);
        assert_eq!(extract_list_fields(html), vec!["notes"]);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let html = "{{ a }} {% for row in b %}{{ row }}{% endfor %} {{ c }}";
        assert_eq!(extract_fields(html), extract_fields(html));
        assert_eq!(extract_list_fields(html), extract_list_fields(html));
    }
}

//! Output-file naming policies.
//!
//! An explicit registry maps template types to naming functions; a type
//! without a registered policy falls back to a timestamped name instead of
//! failing the generation.

use chrono::Utc;
use log::info;
use serde_json::{Map, Value};

use super::models::TemplateType;

type NamingFn = fn(&Map<String, Value>, &str) -> String;

const REGISTRY: &[(TemplateType, NamingFn)] = &[(TemplateType::Proposal, proposal_name)];

/// Resolve the output file name for a generated document.
pub fn file_name_for(
    template_type: TemplateType,
    context: &Map<String, Value>,
    template_name: &str,
) -> String {
    match REGISTRY.iter().find(|(kind, _)| *kind == template_type) {
        Some((_, policy)) => policy(context, template_name),
        None => {
            info!(
                "No naming policy registered for {:?}; using fallback",
                template_type
            );
            fallback_name(template_name)
        }
    }
}

/// `{template_name}_{proposal number}.pdf`, number sanitized for storage paths.
fn proposal_name(context: &Map<String, Value>, template_name: &str) -> String {
    let number = match context.get("proposal_number") {
        Some(Value::String(text)) if !text.trim().is_empty() => sanitize_component(text),
        _ => "new".to_string(),
    };
    format!("{}_{}.pdf", template_name, number)
}

fn fallback_name(template_name: &str) -> String {
    format!("{}_{}.pdf", template_name, Utc::now().format("%Y%m%d%H%M%S"))
}

fn sanitize_component(value: &str) -> String {
    value.replace(['/', '\\'], "-").replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context_with_number(number: &str) -> Map<String, Value> {
        let mut context = Map::new();
        context.insert("proposal_number".to_string(), json!(number));
        context
    }

    #[test]
    fn test_proposal_number_is_path_safe() {
        let name = file_name_for(
            TemplateType::Proposal,
            &context_with_number("12/2024"),
            "Proposal",
        );
        assert_eq!(name, "Proposal_12-2024.pdf");
        assert!(!name.contains('/') && !name.contains('\\'));
    }

    #[test]
    fn test_proposal_number_spaces_and_backslashes() {
        let name = file_name_for(
            TemplateType::Proposal,
            &context_with_number(r"12\2024 rev 2"),
            "Proposal",
        );
        assert_eq!(name, "Proposal_12-2024_rev_2.pdf");
    }

    #[test]
    fn test_missing_proposal_number_defaults() {
        let name = file_name_for(TemplateType::Proposal, &Map::new(), "Proposal");
        assert_eq!(name, "Proposal_new.pdf");
    }

    #[test]
    fn test_unregistered_type_uses_timestamp_fallback() {
        let name = file_name_for(TemplateType::Contract, &Map::new(), "Contract");
        assert!(name.starts_with("Contract_"));
        assert!(name.ends_with(".pdf"));
        // timestamp component is 14 digits
        let stem = name.trim_start_matches("Contract_").trim_end_matches(".pdf");
        assert_eq!(stem.len(), 14);
        assert!(stem.chars().all(|c| c.is_ascii_digit()));
    }
}

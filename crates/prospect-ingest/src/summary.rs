//! Short human-readable summaries written alongside embeddings.

use prospect_core::{EntityKind, EntityRecord};

const MAX_SUMMARY_CHARS: usize = 280;

/// Build a one-line semantic summary, e.g.
/// `"Acme Robotics | Logistics | Berlin | 250 employees"`.
pub fn semantic_summary(entity: &EntityRecord) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    match entity.kind {
        EntityKind::Company => {
            push(&mut parts, entity.first_field_text(&["name", "company_name"]));
            push(&mut parts, entity.first_field_text(&["industry", "sector"]));
            push(&mut parts, entity.first_field_text(&["location", "headquarters", "city"]));
            let size = entity.first_field_text(&["employee_count", "employees", "size"]);
            if !size.is_empty() {
                if size.chars().all(|c| c.is_ascii_digit()) {
                    parts.push(format!("{} employees", size));
                } else {
                    parts.push(size);
                }
            }
        }
        EntityKind::Employee => {
            push(&mut parts, entity.first_field_text(&["name", "full_name"]));
            let title = entity.first_field_text(&["title", "role", "position"]);
            let company = entity.first_field_text(&["company", "company_name", "employer"]);
            match (title.is_empty(), company.is_empty()) {
                (false, false) => parts.push(format!("{} at {}", title, company)),
                (false, true) => parts.push(title),
                (true, false) => parts.push(company),
                (true, true) => {}
            }
            push(&mut parts, entity.first_field_text(&["department", "team"]));
        }
        EntityKind::Enrichment => {
            push(&mut parts, entity.first_field_text(&["description"]));
            push(&mut parts, entity.first_field_text(&["result", "value", "content"]));
        }
    }

    if parts.is_empty() {
        return None;
    }
    let joined = parts.join(" | ");
    Some(crate::truncate_chars(&joined, MAX_SUMMARY_CHARS).to_string())
}

fn push(parts: &mut Vec<String>, value: String) {
    if !value.is_empty() {
        parts.push(value);
    }
}

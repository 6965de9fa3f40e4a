//! Kind-dispatched embedding text templates.
//!
//! Each entity kind concatenates a fixed list of semantic fields. Missing
//! fields render as empty strings and whitespace is collapsed, so the same
//! entity always produces the same text.

use prospect_core::{EntityKind, EntityRecord};

/// Candidate keys per semantic field, in lookup order.
const NAME: &[&str] = &["name", "company_name", "full_name"];
const DESCRIPTION: &[&str] = &["description", "about"];
const INDUSTRY: &[&str] = &["industry", "sector"];
const TECHNOLOGIES: &[&str] = &["technologies", "tech_stack"];
const LOCATION: &[&str] = &["location", "headquarters", "city"];
const SIZE: &[&str] = &["size", "employee_count", "employees"];
const TITLE: &[&str] = &["title", "role", "position"];
const DEPARTMENT: &[&str] = &["department", "team"];
const SKILLS: &[&str] = &["skills"];
const SUMMARY: &[&str] = &["summary", "headline", "bio"];
const COMPANY: &[&str] = &["company", "company_name", "employer"];
const ENRICHMENT_FORMAT: &[&str] = &["format"];
const ENRICHMENT_RESULT: &[&str] = &["result", "value", "content"];

/// Build the canonical embedding text for an entity.
pub fn canonicalize(entity: &EntityRecord) -> String {
    let fields: &[&[&str]] = match entity.kind {
        EntityKind::Company => &[
            NAME,
            DESCRIPTION,
            INDUSTRY,
            TECHNOLOGIES,
            LOCATION,
            SIZE,
            SUMMARY,
        ],
        EntityKind::Employee => &[
            NAME, TITLE, DEPARTMENT, COMPANY, SKILLS, LOCATION, SUMMARY,
        ],
        EntityKind::Enrichment => &[DESCRIPTION, ENRICHMENT_FORMAT, ENRICHMENT_RESULT, SUMMARY],
    };

    let parts: Vec<String> = fields.iter().map(|keys| entity.first_field_text(keys)).collect();
    collapse_whitespace(&parts.join(" "))
}

/// Truncate to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

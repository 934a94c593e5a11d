// Category extraction

use std::collections::HashMap;
use super::{ElementRecord, SetRecord};

/// Derive the categories referenced by the records.
///
/// Ids follow first appearance in the CSV, not alphabetical order, so the
/// legend in the annotation UI lists categories the way they were authored.
/// A category takes the color of its first element if that element has one,
/// otherwise the default color for its name.
pub fn extract_sets(records: &[ElementRecord]) -> Vec<SetRecord> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut ordered: Vec<(usize, &str, &str)> = Vec::new();

    for (position, record) in records.iter().enumerate() {
        let name = record.set_label.as_str();
        if !first_seen.contains_key(name) {
            first_seen.insert(name, position);
            ordered.push((position, name, record.resolved_color()));
        }
    }

    ordered.sort_by_key(|&(position, _, _)| position);

    ordered
        .into_iter()
        .enumerate()
        .map(|(id, (_, name, color))| SetRecord {
            id,
            name: name.to_string(),
            color: color.to_string(),
        })
        .collect()
}

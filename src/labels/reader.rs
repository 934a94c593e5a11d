// CSV parsing and validation for label rows

use std::collections::HashMap;
use std::fs;
use std::hash::Hash;
use std::path::Path;
use std::sync::OnceLock;
use regex::Regex;

use crate::constants::{COL_COLOR, COL_ELEMENT_LABEL, COL_ID, COL_SET_LABEL, REQUIRED_COLUMNS};
use crate::error::{LabelError, Result};
use super::ElementRecord;

const COLOR_PATTERN: &str = r"^#[0-9A-Fa-f]{6}$";
const UTF8_BOM: char = '\u{feff}';

/// Column positions resolved from the header row.
struct Columns {
    id: usize,
    set_label: usize,
    element_label: usize,
    color: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        match (find(COL_ID), find(COL_SET_LABEL), find(COL_ELEMENT_LABEL)) {
            (Some(id), Some(set_label), Some(element_label)) => Ok(Columns {
                id,
                set_label,
                element_label,
                color: find(COL_COLOR),
            }),
            _ => {
                let found: Vec<&str> = headers.iter().collect();
                Err(LabelError::format(1, format!(
                    "CSV missing required columns. Required: {}, Found: {}",
                    REQUIRED_COLUMNS.join(", "),
                    if found.is_empty() { "(none)".to_string() } else { found.join(", ") }
                )))
            }
        }
    }
}

/// Read the label CSV into element records, in file order.
///
/// Line numbers in errors are 1-based with the header on line 1.
pub fn read_csv(csv_path: &Path) -> Result<Vec<ElementRecord>> {
    if !csv_path.exists() {
        return Err(LabelError::not_found("CSV file", csv_path));
    }

    let bytes = fs::read(csv_path)?;
    let content = String::from_utf8(bytes).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
        LabelError::format(line, "file is not valid UTF-8")
    })?;
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(&content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers().map_err(|e| csv_error(e, 1))?.clone();
    let columns = Columns::from_headers(&headers)?;

    let mut records = Vec::new();

    for (idx, row) in reader.records().enumerate() {
        let row = row.map_err(|e| csv_error(e, idx + 2))?;
        let line = row
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);
        let field = |i: usize| row.get(i).unwrap_or("");

        let raw_id = field(columns.id);
        let id: i64 = raw_id.parse().map_err(|_| {
            LabelError::format(line, format!("Invalid ID format '{}' (must be integer)", raw_id))
        })?;

        let set_label = field(columns.set_label);
        if set_label.is_empty() {
            return Err(LabelError::format(line, "set_label cannot be empty"));
        }

        let element_label = field(columns.element_label);
        if element_label.is_empty() {
            return Err(LabelError::format(line, "element_label cannot be empty"));
        }

        // mapping files are one entry per line
        for (name, value) in [(COL_SET_LABEL, set_label), (COL_ELEMENT_LABEL, element_label)] {
            if value.contains(['\n', '\r']) {
                return Err(LabelError::format(line, format!("{} cannot contain a line break", name)));
            }
        }

        let color = columns
            .color
            .map(field)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        records.push(ElementRecord {
            id,
            set_label: set_label.to_string(),
            element_label: element_label.to_string(),
            color,
        });
    }

    if records.is_empty() {
        return Err(LabelError::EmptyInput);
    }

    log::debug!("Parsed {} element rows from {}", records.len(), csv_path.display());
    Ok(records)
}

/// Compiled once; `None` (logged) if the pattern does not compile.
fn color_regex() -> Option<&'static Regex> {
    static COLOR_RE: OnceLock<Option<Regex>> = OnceLock::new();
    COLOR_RE
        .get_or_init(|| match Regex::new(COLOR_PATTERN) {
            Ok(re) => Some(re),
            Err(e) => {
                log::error!("Color pattern {} failed to compile: {}", COLOR_PATTERN, e);
                None
            }
        })
        .as_ref()
}

fn csv_error(err: csv::Error, fallback_line: usize) -> LabelError {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(fallback_line);
    LabelError::format(line, format!("Malformed CSV: {}", err))
}

/// Check id sequence, uniqueness and color format.
/// Returns every problem found; an empty list means the records are usable.
pub fn validate(records: &[ElementRecord]) -> Vec<String> {
    let mut problems = Vec::new();

    for (i, record) in records.iter().enumerate() {
        if record.id != i as i64 {
            problems.push(format!(
                "Element at row {}: Expected ID {}, got {} (IDs must be sequential starting from 0)",
                i + 2, i, record.id
            ));
        }
    }

    for (id, count) in count_in_order(records.iter().map(|r| r.id)) {
        if count > 1 {
            problems.push(format!("Duplicate ID {} appears {} times", id, count));
        }
    }

    for (label, count) in count_in_order(records.iter().map(|r| r.element_label.as_str())) {
        if count > 1 {
            problems.push(format!("Duplicate element_label '{}' appears {} times", label, count));
        }
    }

    let colored = records.iter().filter_map(|r| r.color.as_deref().map(|c| (r, c)));
    match color_regex() {
        Some(re) => {
            for (record, color) in colored {
                if !re.is_match(color) {
                    problems.push(format!(
                        "ID {} ('{}'): Invalid color format '{}' (must be #RRGGBB)",
                        record.id, record.element_label, color
                    ));
                }
            }
        }
        None => {
            if colored.count() > 0 {
                problems.push("Colors could not be checked: color pattern failed to compile".to_string());
            }
        }
    }

    problems
}

/// Occurrence counts keyed by value, in order of first occurrence.
fn count_in_order<K: Eq + Hash + Copy>(keys: impl Iterator<Item = K>) -> Vec<(K, usize)> {
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();

    for key in keys {
        match positions.get(&key) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                positions.insert(key, counts.len());
                counts.push((key, 1));
            }
        }
    }

    counts
}

// Skate Labels Constants
// Downstream annotation tools read these names. Do not change without updating the backend.

// Mapping files
pub const ELEMENT_MAPPING_FILENAME: &str = "mapping_step_element.txt";
pub const SET_MAPPING_FILENAME: &str = "mapping_step_set.txt";
pub const DEFAULT_MAPPING_DIR: &str = "mapping";

// Backups
pub const BACKUP_INFIX: &str = ".backup_";
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// Database
pub const DEFAULT_DB_PATH: &str = "backend/data/annotations.db";
pub const DEFAULT_PROJECT: &str = "default";
pub const UPDATED_BY_TAG: &str = "csv_import_script";
pub const MAPPING_NAME: &str = "default";

// Environment overrides
pub const ENV_DB_PATH: &str = "SKATE_LABELS_DB_PATH";
pub const ENV_MAPPING_DIR: &str = "SKATE_LABELS_MAPPING_DIR";

// CSV columns
pub const COL_ID: &str = "id";
pub const COL_SET_LABEL: &str = "set_label";
pub const COL_ELEMENT_LABEL: &str = "element_label";
pub const COL_COLOR: &str = "color";
pub const REQUIRED_COLUMNS: [&str; 3] = [COL_ID, COL_SET_LABEL, COL_ELEMENT_LABEL];

// Preview
pub const PREVIEW_ELEMENT_LINES: usize = 10;

// Category colors (kept in sync with the web UI legend)
pub const FALLBACK_CATEGORY: &str = "Other";
pub const FALLBACK_COLOR: &str = "#9ca3af";

pub const CATEGORY_COLORS: [(&str, &str); 22] = [
    ("Three_Turn", "#3b82f6"),
    ("Bracket_Turn", "#8b5cf6"),
    ("Rocker_Turn", "#06b6d4"),
    ("Counter_Turn", "#10b981"),
    ("Loop_Turn", "#f59e0b"),
    ("Twizzle", "#ef4444"),
    ("Toe_Step", "#ec4899"),
    ("Chasse", "#84cc16"),
    ("Mohawk", "#f97316"),
    ("Choctaw", "#8b5cf6"),
    ("Change_of_Edge", "#06b6d4"),
    ("Cross_Roll", "#059669"),
    ("Swing_Roll", "#0d9488"),
    ("Cross_Over", "#7c3aed"),
    ("Spiral", "#db2777"),
    ("Arabesque", "#be185d"),
    ("Spread_Eagles", "#c2410c"),
    ("Ina_Bauers", "#7c2d12"),
    ("Hydroblading", "#1e40af"),
    ("Knee_Slide", "#374151"),
    ("NONE", "#6b7280"),
    (FALLBACK_CATEGORY, FALLBACK_COLOR),
];

/// Default color for a category, falling back to the `Other` color.
pub fn default_category_color(category: &str) -> &'static str {
    CATEGORY_COLORS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK_COLOR)
}

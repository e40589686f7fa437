/// Folds free text into its comparison form: transliterated to ASCII
/// (accents and letters like `ø`, `ł`, `ß` included), lowercased, surrounding
/// whitespace trimmed. Total and idempotent.
pub fn normalize(value: &str) -> String {
    deunicode::deunicode(value).to_lowercase().trim().to_string()
}

/// Same as [`normalize`] for values read from optional columns.
pub fn normalize_opt(value: Option<&str>) -> String {
    value.map(normalize).unwrap_or_default()
}

use chrono::NaiveDate;

/// Date formats accepted across the platform, tried strictly in this
/// order; the first successful parse wins.
pub const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y-%m-%dT%H:%M:%S"];

/// Canonicalizes a user-entered contract number: strips surrounding
/// whitespace and keeps only the digits. Never fails; an empty result
/// means the input carried no usable identifier and callers must reject
/// it as invalid.
pub fn normalize_contract(raw: &str) -> String {
    raw.trim().chars().filter(char::is_ascii_digit).collect()
}

/// Parses a date field against [`DATE_FORMATS`]. Returns `None` for
/// empty input or when no format matches; malformed input is "absent",
/// not an error.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Renders a date the way reports display it.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

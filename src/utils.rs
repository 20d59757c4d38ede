//! Utility functions for naming on-disk and in-database artifacts

/// Turn a channel name into a single safe path component.
///
/// Channel names are free text. Path separators, NUL and `%` are
/// percent-escaped, and names that would resolve to the current or parent
/// directory are escaped too, so the result always stays directly under the
/// media root. The mapping is one-to-one: distinct channel names never share
/// a directory.
///
/// # Examples
///
/// ```
/// use wall_ingest::utils::sanitize_dir_name;
///
/// assert_eq!(sanitize_dir_name("News/Daily"), "News%2FDaily");
/// assert_eq!(sanitize_dir_name("News_Daily"), "News_Daily");
/// assert_eq!(sanitize_dir_name(".."), "%2E%2E");
/// assert_eq!(sanitize_dir_name("Котики"), "Котики");
/// ```
pub fn sanitize_dir_name(name: &str) -> String {
    match name {
        "" => return "%".to_string(),
        "." => return "%2E".to_string(),
        ".." => return "%2E%2E".to_string(),
        _ => {}
    }

    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            '\\' => escaped.push_str("%5C"),
            '\0' => escaped.push_str("%00"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Quote a string as an SQLite identifier (embedded `"` doubled).
///
/// Used for per-channel ledger tables, whose names are channel names and may
/// contain spaces, quotes or non-ASCII text.
///
/// # Examples
///
/// ```
/// use wall_ingest::utils::quote_identifier;
///
/// assert_eq!(quote_identifier("demo"), "\"demo\"");
/// assert_eq!(quote_identifier("say \"hi\""), "\"say \"\"hi\"\"\"");
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

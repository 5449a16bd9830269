//! Reusable regex fragments for route option patterns.

use std::collections::BTreeMap;

/// Conventional action names.
pub const ACTION: &str = "index|show|add|create|edit|update|remove|del|delete|view|item";
/// Four-digit year, 1000-2999.
pub const YEAR: &str = "[12][0-9]{3}";
/// Two-digit month.
pub const MONTH: &str = "0[1-9]|1[012]";
/// Two-digit day of month.
pub const DAY: &str = "0[1-9]|[12][0-9]|3[01]";
/// Numeric identifier.
pub const ID: &str = "[0-9]+";
/// Hyphenated hexadecimal UUID.
pub const UUID: &str =
    "[A-Fa-f0-9]{8}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{12}";

/// All named expressions, keyed by name.
pub fn named_expressions() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("Action", ACTION),
        ("Year", YEAR),
        ("Month", MONTH),
        ("Day", DAY),
        ("ID", ID),
        ("UUID", UUID),
    ])
}

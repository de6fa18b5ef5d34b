//! Naming conventions shared by the generators and the bridge.
//!
//! Entity `order_line` (or `OrderLine`, or `order-line`) always becomes
//! message `OrderLine` and service `OrderLineService`; property `UserId`
//! becomes proto field `user_id` and graph field `userId`. Downstream code
//! generation depends on these names being stable.

use std::sync::LazyLock;

use inflector::Inflector;
use regex::Regex;

static INVALID_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Irregular plurals that inflector gets wrong for table names.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("analysis", "analyses"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("medium", "media"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
];

/// Pluralize a word, handling irregulars first then falling back to inflector.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *singular || lower == *plural {
            return plural.to_string();
        }
    }

    word.to_plural()
}

/// Singularize a word, handling irregulars first then falling back to inflector.
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *plural || lower == *singular {
            return singular.to_string();
        }
    }

    word.to_singular()
}

/// Replace runs of characters that are not valid in identifiers with `_`.
fn sanitize(name: &str) -> String {
    INVALID_CHARS.replace_all(name.trim(), "_").into_owned()
}

/// Identifiers must start with a letter.
fn ensure_leading_letter(name: String, prefix: &str) -> String {
    match name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => name,
        _ => format!("{prefix}{name}"),
    }
}

/// PascalCase type name for an entity (`order_line` → `OrderLine`).
pub fn message_name(entity: &str) -> String {
    ensure_leading_letter(sanitize(entity).to_pascal_case(), "E")
}

/// `{Entity}Service`.
pub fn service_name(entity: &str) -> String {
    format!("{}Service", message_name(entity))
}

/// snake_case proto field name (`UserId` → `user_id`).
pub fn field_name(property: &str) -> String {
    ensure_leading_letter(sanitize(property).to_snake_case(), "f_")
}

/// camelCase graph field name (`UserId` → `userId`).
pub fn graph_field_name(name: &str) -> String {
    ensure_leading_letter(sanitize(name).to_camel_case(), "f")
}

/// Root list field for an entity (`OrderLine` → `orderLines`).
pub fn graph_collection_name(entity: &str) -> String {
    graph_field_name(&pluralize(&sanitize(entity).to_snake_case()))
}

/// Make `name` unique against `taken` by appending `_2`, `_3`, ...
pub(crate) fn dedupe(name: String, taken: &mut std::collections::HashSet<String>) -> String {
    if taken.insert(name.clone()) {
        return name;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{name}_{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

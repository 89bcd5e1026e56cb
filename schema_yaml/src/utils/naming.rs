//! Naming utilities for schema_yaml
//!
//! Identifier normalisation, generated constraint names and keyword quoting.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Common SQL keywords across the supported databases
static SQL_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "add", "all", "alter", "and", "any", "as", "asc", "begin", "between", "by", "case",
        "check", "column", "constraint", "create", "cross", "current_date", "current_time",
        "current_timestamp", "database", "default", "delete", "desc", "distinct", "drop",
        "else", "end", "except", "exists", "foreign", "from", "full", "grant", "group",
        "having", "in", "index", "inner", "insert", "intersect", "into", "is", "join", "key",
        "left", "like", "limit", "natural", "not", "null", "offset", "on", "or", "order",
        "outer", "primary", "references", "right", "select", "set", "table", "then", "to",
        "union", "unique", "update", "user", "using", "values", "view", "when", "where",
        "with",
    ]
    .into_iter()
    .collect()
});

/// Normalise an identifier for case-insensitive lookups
pub fn normalize_identifier(name: &str) -> String {
    name.to_lowercase()
}

/// Generate a constraint or index name from the table and column names
///
/// The name is `PREFIX_` followed by a hash of every part, upper-cased and
/// cut to `max_length` characters.
pub fn generate_identifier_name(parts: &[&str], prefix: &str, max_length: usize) -> String {
    let hash: String = parts
        .iter()
        .map(|part| format!("{:x}", md5::compute(part.as_bytes()))[..8].to_string())
        .collect();

    let name = format!("{}_{}", prefix, hash).to_uppercase();
    name.chars().take(max_length).collect()
}

/// Check if a name is a reserved SQL keyword
pub fn is_sql_keyword(name: &str) -> bool {
    SQL_KEYWORDS.contains(name.to_lowercase().as_str())
}

/// Quote a name with the given delimiters if it is a reserved keyword
pub fn quote_if_reserved(name: &str, open: char, close: char) -> String {
    if is_sql_keyword(name) {
        let escaped = name.replace(close, &format!("{}{}", close, close));
        format!("{}{}{}", open, escaped, close)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("MyTable"), "mytable");
        assert_eq!(normalize_identifier("my_table"), "my_table");
    }

    #[test]
    fn test_generate_identifier_name() {
        let name = generate_identifier_name(&["my_table", "main_id"], "fk", 63);

        assert!(name.starts_with("FK_"));
        assert_eq!(name.len(), 3 + 16);
        assert_eq!(name, name.to_uppercase());
        assert_eq!(name, generate_identifier_name(&["my_table", "main_id"], "fk", 63));
        assert_ne!(name, generate_identifier_name(&["my_table", "other_id"], "fk", 63));
    }

    #[test]
    fn test_generate_identifier_name_truncates() {
        let name = generate_identifier_name(&["a", "b", "c", "d"], "idx", 12);

        assert_eq!(name.len(), 12);
        assert!(name.starts_with("IDX_"));
    }

    #[test]
    fn test_quote_if_reserved() {
        assert_eq!(quote_if_reserved("order", '"', '"'), "\"order\"");
        assert_eq!(quote_if_reserved("User", '`', '`'), "`User`");
        assert_eq!(quote_if_reserved("my_table", '"', '"'), "my_table");
    }
}

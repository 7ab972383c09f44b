//! Identifier validation and escaping for emitted DDL and query text.
//!
//! Identifiers are emitted bare whenever that is unambiguous and wrapped in
//! the delimiter character otherwise. An identifier needs escaping when:
//!
//! 1. it is a reserved word (compared case-insensitively),
//! 2. its first character is neither a letter nor one of `#`, `@`, or
//! 3. any later character is not a letter, digit or underscore.
//!
//! Escaping wraps the identifier in [`ID_ESCAPE_CHAR`] and doubles any
//! embedded delimiter.

use crate::error::{Result, TranslateError};

/// Delimiter used to escape identifiers.
pub const ID_ESCAPE_CHAR: char = '"';

/// Maximum identifier length accepted by the emitter.
const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Leading symbols allowed in an unescaped identifier.
const LEADING_SYMBOLS: &[char] = &['#', '@'];

/// Reserved words, upper case, sorted for binary search.
const RESERVED_WORDS: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "ANY", "ARRAY", "AS", "ASC", "ATOMIC", "AUTHORIZATION",
    "BEGIN", "BETWEEN", "BIGINT", "BINARY", "BLOB", "BOOLEAN", "BOTH", "BREAK", "BY", "CALL",
    "CASE", "CAST", "CHAR", "CHARACTER", "CHECK", "CLOB", "COLUMN", "COMMIT", "CONSTRAINT",
    "CONTINUE", "CONVERT", "CREATE", "CROSS", "CURRENT_DATE", "CURRENT_TIME",
    "CURRENT_TIMESTAMP", "CURRENT_USER", "DATE", "DAY", "DECIMAL", "DECLARE", "DEFAULT",
    "DELETE", "DESC", "DISTINCT", "DOUBLE", "DROP", "EACH", "ELSE", "END", "ERROR", "ESCAPE",
    "EXCEPT", "EXEC", "EXECUTE", "EXISTS", "FALSE", "FETCH", "FILTER", "FLOAT", "FOR",
    "FOREIGN", "FROM", "FULL", "FUNCTION", "GLOBAL", "GROUP", "HAVING", "HOUR", "IF",
    "IMMEDIATE", "IN", "INNER", "INOUT", "INSERT", "INTEGER", "INTERSECT", "INTO", "IS",
    "JOIN", "LANGUAGE", "LATERAL", "LEADING", "LEAVE", "LEFT", "LIKE", "LIKE_REGEX", "LIMIT",
    "LOCAL", "LOOP", "MAKEDEP", "MAKENOTDEP", "MERGE", "MINUTE", "MONTH", "NO", "NOCACHE",
    "NOT", "NULL", "OF", "OFFSET", "ON", "ONLY", "OPTION", "OPTIONS", "OR", "ORDER", "OUT",
    "OUTER", "OVER", "PARAMETER", "PARTITION", "PRIMARY", "PROCEDURE", "REAL", "REFERENCES",
    "RETURN", "RETURNS", "RIGHT", "ROLLUP", "ROW", "ROWS", "SECOND", "SELECT", "SET",
    "SIMILAR", "SMALLINT", "SOME", "SPECIFIC", "SQLEXCEPTION", "START", "STATIC", "SYSTEM",
    "TABLE", "TEMPORARY", "THEN", "TIME", "TIMESTAMP", "TINYINT", "TO", "TRAILING",
    "TRANSLATE", "TRIGGER", "TRUE", "UNION", "UNIQUE", "UNKNOWN", "UPDATE", "USER", "USING",
    "VALUES", "VARBINARY", "VARCHAR", "VIRTUAL", "WHEN", "WHERE", "WHILE", "WITH", "WITHOUT",
    "XML", "XMLAGG", "XMLATTRIBUTES", "XMLCOMMENT", "XMLCONCAT", "XMLELEMENT", "XMLFOREST",
    "XMLNAMESPACES", "XMLPARSE", "XMLPI", "XMLQUERY", "XMLSERIALIZE", "XMLTABLE", "YEAR",
];

/// Validate an identifier handed to the emitter.
///
/// Rejects empty identifiers, identifiers containing null bytes and
/// identifiers longer than the maximum length.
///
/// # Errors
///
/// Returns `TranslateError::Schema` describing the violation.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TranslateError::Schema(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(TranslateError::Schema(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(TranslateError::Schema(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Whether `word` is reserved (case-insensitive).
pub fn is_reserved_word(word: &str) -> bool {
    let upper = word.to_ascii_uppercase();
    RESERVED_WORDS.binary_search(&upper.as_str()).is_ok()
}

/// Whether an identifier can be emitted without delimiters.
fn is_bare_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    let Some(start) = chars.next() else {
        return false;
    };
    if !(start.is_alphabetic() || LEADING_SYMBOLS.contains(&start)) {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Escape a single-part identifier.
///
/// # Examples
///
/// ```
/// use store_translator::core::identifier::escape_single_part;
///
/// assert_eq!(escape_single_part("order_id"), "order_id");
/// assert_eq!(escape_single_part("Order"), "\"Order\"");
/// assert_eq!(escape_single_part("my col"), "\"my col\"");
/// assert_eq!(escape_single_part("a\"b"), "\"a\"\"b\"");
/// ```
pub fn escape_single_part(part: &str) -> String {
    if is_reserved_word(part) {
        return format!("{0}{1}{0}", ID_ESCAPE_CHAR, part);
    }
    if is_bare_identifier(part) {
        return part.to_string();
    }
    let doubled = format!("{0}{0}", ID_ESCAPE_CHAR);
    format!(
        "{0}{1}{0}",
        ID_ESCAPE_CHAR,
        part.replace(ID_ESCAPE_CHAR, &doubled)
    )
}

/// Validate then escape an identifier.
pub fn escape_validated(part: &str) -> Result<String> {
    validate_identifier(part)?;
    Ok(escape_single_part(part))
}

/// Remove one matching pair of surrounding single or double quotes.
///
/// Values without a matching pair are returned unchanged.
pub fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

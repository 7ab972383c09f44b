//! Option-key namespace prefixes.
//!
//! Option keys may be written `{uri}localName`. On output the URI is replaced
//! by a short prefix (`prefix:localName`). Well-known URIs have fixed
//! prefixes; any other URI is assigned `n<k>`, where `k` is the number of
//! entries the table held when the URI was first seen.

use tracing::warn;

/// Built-in `(prefix, uri)` pairs.
pub const BUILTIN_NAMESPACES: &[(&str, &str)] = &[
    ("rel", "urn:recordstore:ext:relational"),
    ("store", "urn:recordstore:ext:store"),
    ("doc", "urn:recordstore:ext:document"),
    ("odata", "urn:recordstore:ext:odata"),
    ("mongo", "urn:recordstore:ext:mongodb"),
];

/// Built-in prefix for `uri`, if any.
pub fn builtin_prefix(uri: &str) -> Option<&'static str> {
    BUILTIN_NAMESPACES
        .iter()
        .find(|(_, u)| *u == uri)
        .map(|(p, _)| *p)
}

/// URI to prefix assignments made during one emission, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespacePrefixTable {
    entries: Vec<(String, String)>,
}

impl NamespacePrefixTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prefix already assigned to `uri`.
    pub fn get(&self, uri: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(u, _)| u == uri)
            .map(|(_, p)| p.as_str())
    }

    /// `(uri, prefix)` pairs in assignment order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(u, p)| (u.as_str(), p.as_str()))
    }

    /// Resolve the prefix for `uri`.
    ///
    /// A URI enters the table when it has no built-in prefix and
    /// `synthesize` is set, or whenever `always_declare` is set. Entries are
    /// reused on later lookups. Returns `None` only when the URI is unknown
    /// and neither flag allows declaring it.
    pub fn resolve(&mut self, uri: &str, synthesize: bool, always_declare: bool) -> Option<String> {
        let builtin = builtin_prefix(uri);
        if !((builtin.is_none() && synthesize) || always_declare) {
            return builtin.map(str::to_string);
        }
        if let Some(existing) = self.get(uri) {
            return Some(existing.to_string());
        }
        let prefix = match builtin {
            Some(p) => p.to_string(),
            None => format!("n{}", self.entries.len()),
        };
        self.entries.push((uri.to_string(), prefix.clone()));
        Some(prefix)
    }

    /// Rewrite a `{uri}localName` key to `prefix:localName`.
    ///
    /// Keys not in that form are returned unchanged. When no prefix can be
    /// resolved the original key, braces included, is kept.
    pub fn rewrite_key(&mut self, key: &str, synthesize: bool, always_declare: bool) -> String {
        if key.len() <= 2 || !key.starts_with('{') {
            return key.to_string();
        }
        let close = match key.find('}') {
            Some(index) if index > 1 => index,
            _ => return key.to_string(),
        };
        let uri = &key[1..close];
        let local = &key[close + 1..];
        match self.resolve(uri, synthesize, always_declare) {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => {
                warn!(
                    "No prefix for namespace {}; emitting option key {} unchanged",
                    uri, key
                );
                key.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_uris_numbered_in_first_seen_order() {
        let mut table = NamespacePrefixTable::new();
        assert_eq!(table.rewrite_key("{urn:a}x", true, false), "n0:x");
        assert_eq!(table.rewrite_key("{urn:b}y", true, false), "n1:y");
        assert_eq!(table.rewrite_key("{urn:a}z", true, false), "n0:z");
        let entries: Vec<_> = table.entries().collect();
        assert_eq!(entries, vec![("urn:a", "n0"), ("urn:b", "n1")]);
    }

    #[test]
    fn test_builtin_not_recorded_unless_always_declared() {
        let mut table = NamespacePrefixTable::new();
        assert_eq!(
            table.rewrite_key("{urn:recordstore:ext:relational}type", true, false),
            "rel:type"
        );
        assert!(table.is_empty());
        assert_eq!(table.rewrite_key("{urn:x}a", true, false), "n0:a");
    }

    #[test]
    fn test_always_declare_records_builtin_and_counts_it() {
        let mut table = NamespacePrefixTable::new();
        assert_eq!(
            table.rewrite_key("{urn:recordstore:ext:store}k", false, true),
            "store:k"
        );
        assert_eq!(table.rewrite_key("{urn:x}a", false, true), "n1:a");
        assert_eq!(table.get("urn:recordstore:ext:store"), Some("store"));
    }

    #[test]
    fn test_unresolvable_keeps_raw_key() {
        let mut table = NamespacePrefixTable::new();
        assert_eq!(table.rewrite_key("{urn:x}a", false, false), "{urn:x}a");
        assert!(table.is_empty());
        // Built-ins still resolve with synthesis disabled.
        assert_eq!(
            table.rewrite_key("{urn:recordstore:ext:document}p", false, false),
            "doc:p"
        );
    }

    #[test]
    fn test_non_namespaced_keys_untouched() {
        let mut table = NamespacePrefixTable::new();
        assert_eq!(table.rewrite_key("UUID", true, true), "UUID");
        assert_eq!(table.rewrite_key("{}", true, true), "{}");
        assert_eq!(table.rewrite_key("{}abc", true, true), "{}abc");
        assert_eq!(table.rewrite_key("{abc", true, true), "{abc");
        assert!(table.is_empty());
    }
}

//! Canonical collection names.
//!
//! Some stores report collection names qualified with their database, e.g.
//! `mydb.orders`. A [`Namespace`] strips that `<database>.` prefix from incoming path
//! segments and from store-reported names so that only canonical names cross the API.

/// The `<database>.` prefix of one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>) -> Self {
        Self { prefix: format!("{}.", database.into()) }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the canonical name of a raw path segment.
    ///
    /// Only a literal prefix at the very start is removed; any other segment is
    /// returned unchanged.
    pub fn resolve<'a>(&self, raw: &'a str) -> &'a str {
        raw.strip_prefix(self.prefix.as_str()).unwrap_or(raw)
    }

    /// Strips the prefix from every store-reported name, preserving order.
    pub fn strip_all(&self, names: impl IntoIterator<Item = String>) -> Vec<String> {
        names
            .into_iter()
            .map(|name| match name.strip_prefix(self.prefix.as_str()) {
                Some(canonical) => canonical.to_string(),
                None => name,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_and_bare_segments_resolve_to_the_same_name() {
        let ns = Namespace::new("mydb");

        assert_eq!(ns.prefix(), "mydb.");
        assert_eq!(ns.resolve("mydb.orders"), "orders");
        assert_eq!(ns.resolve("orders"), "orders");
    }

    #[test]
    fn only_a_leading_prefix_is_stripped() {
        let ns = Namespace::new("mydb");

        assert_eq!(ns.resolve("other.mydb.orders"), "other.mydb.orders");
        assert_eq!(ns.resolve("mydborders"), "mydborders");
        assert_eq!(ns.resolve("mydb.mydb.orders"), "mydb.orders");
    }

    #[test]
    fn strip_all_keeps_store_order() {
        let ns = Namespace::new("mydb");
        let names = vec![
            "mydb.orders".to_string(),
            "items".to_string(),
            "mydb.system.indexes".to_string(),
        ];

        assert_eq!(ns.strip_all(names), vec!["orders", "items", "system.indexes"]);
    }
}

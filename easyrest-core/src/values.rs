//! Multi-valued string maps for query strings and url-encoded forms.

use crate::Error;
use std::collections::BTreeMap;
use std::fmt;

/// Decoded query or form parameters.
///
/// Every key maps to the list of values it was given, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    inner: BTreeMap<String, Vec<String>>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `application/x-www-form-urlencoded` query string.
    pub fn parse(query: &str) -> Result<Self, Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| Error::Form(format!("Failed to parse query string: {}", e)))?;

        Ok(pairs.into_iter().collect())
    }

    /// Decode an `application/x-www-form-urlencoded` body.
    pub fn parse_form(body: &[u8]) -> Result<Self, Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| Error::Form(format!("Failed to parse form data: {}", e)))?;

        Ok(pairs.into_iter().collect())
    }

    /// The first value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values for `key`, in order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append a value to `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    /// Append every value of `other` after the values already present.
    pub fn extend(&mut self, other: Values) {
        for (key, values) in other.inner {
            self.inner.entry(key).or_default().extend(values);
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Encode back into `application/x-www-form-urlencoded` form.
    pub fn encode(&self) -> String {
        let pairs: Vec<(&str, &str)> = self
            .inner
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| (key.as_str(), v.as_str())))
            .collect();

        serde_urlencoded::to_string(pairs).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Values::new();
        for (key, value) in iter {
            values.add(key, value);
        }
        values
    }
}

impl From<BTreeMap<String, Vec<String>>> for Values {
    fn from(inner: BTreeMap<String, Vec<String>>) -> Self {
        Self { inner }
    }
}

impl From<Values> for BTreeMap<String, Vec<String>> {
    fn from(values: Values) -> Self {
        values.inner
    }
}

impl fmt::Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("map[")?;
        for (i, (key, values)) in self.inner.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}:[{}]", key, values.join(" "))?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_key() {
        let values = Values::parse("key=value").unwrap();
        let expected: BTreeMap<String, Vec<String>> =
            [("key".to_string(), vec!["value".to_string()])].into();
        assert_eq!(BTreeMap::from(values), expected);
    }

    #[test]
    fn test_parse_preserves_repeated_values_in_order() {
        let values = Values::parse("tag=rust&tag=web&tag=framework").unwrap();
        assert_eq!(values.get("tag"), Some("rust"));
        assert_eq!(values.get_all("tag"), ["rust", "web", "framework"]);
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_parse_decodes_escapes() {
        let values = Values::parse_form(b"name=John+Doe&email=john%40example.com").unwrap();
        assert_eq!(values.get("name"), Some("John Doe"));
        assert_eq!(values.get("email"), Some("john@example.com"));
    }

    #[test]
    fn test_parse_empty() {
        assert!(Values::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_extend_appends_after_existing() {
        let mut body = Values::parse("a=1").unwrap();
        body.extend(Values::parse("a=2&b=3").unwrap());
        assert_eq!(body.get_all("a"), ["1", "2"]);
        assert_eq!(body.get("b"), Some("3"));
    }

    #[test]
    fn test_encode_and_display() {
        let values: Values = [("b", "2"), ("a", "x y")].into_iter().collect();
        assert_eq!(values.encode(), "a=x+y&b=2");
        assert_eq!(values.to_string(), "map[a:[x y] b:[2]]");
    }
}

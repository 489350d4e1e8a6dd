//! The record draft assembled before persistence.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::FieldValue;

/// An insertion-ordered map from field name to value.
///
/// Keys are unique: writing an existing key replaces its value in place
/// without changing its position. Drafts hold a few dozen fields at most, so
/// lookups are linear.
///
/// ```rust
/// use calllog_fields::core::{AttributeMap, FieldValue};
///
/// let mut draft = AttributeMap::new();
/// draft.put("number", "13800138000");
/// draft.put("duration", 30_i64);
/// draft.put("duration", 45_i64);
///
/// assert_eq!(draft.len(), 2);
/// assert_eq!(draft.get_i64("duration"), Some(45));
/// assert_eq!(draft.keys().collect::<Vec<_>>(), vec!["number", "duration"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    entries: Vec<(String, FieldValue)>,
}

impl AttributeMap {
    /// Creates an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `field` to `value`, returning the previous value if any.
    pub fn put(
        &mut self,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        let field = field.into();
        let value = value.into();
        match self.position(&field) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((field, value));
                None
            }
        }
    }

    /// Sets `field` to an explicit null.
    pub fn put_null(&mut self, field: impl Into<String>) -> Option<FieldValue> {
        self.put(field, FieldValue::Null)
    }

    /// Returns the value stored for `field`.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.position(field).map(|idx| &self.entries[idx].1)
    }

    /// Returns the value for `field` interpreted as an integer.
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::to_i64_lossy)
    }

    /// Returns true if `field` is present (including explicit nulls).
    pub fn contains(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    /// Removes `field`, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.position(field).map(|idx| self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Consumes the draft, yielding its entries in insertion order.
    pub fn into_entries(self) -> Vec<(String, FieldValue)> {
        self.entries
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == field)
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeMap
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AttributeMap::new();
        for (k, v) in iter {
            map.put(k, v);
        }
        map
    }
}

impl Serialize for AttributeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

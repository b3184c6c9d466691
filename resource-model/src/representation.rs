//! Attribute bags exchanged in every request, response and notification
//!
//! A [`Representation`] is an ordered mapping from attribute name to
//! [`Value`]. Names are unique: setting an existing name replaces its value in
//! place and keeps its position, so encoding is stable across updates.
//!
//! Decoding skips attributes whose value has none of the supported shapes
//! (floats, objects, mixed lists); only a payload that is not a map fails.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{ResourceError, Result};
use crate::value::Value;

/// Ordered attribute name to value mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Representation {
    attributes: Vec<(String, Value)>,
}

impl Representation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace an attribute, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.attributes.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.attributes.iter().position(|(n, _)| n == name)?;
        Some(self.attributes.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Attribute names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v))
    }

    // ========================================================================
    // Typed getters
    // ========================================================================
    //
    // `Ok(None)` means the attribute is absent. A present attribute of the
    // wrong type is a validation error.

    pub fn get_int(&self, name: &str) -> Result<Option<i64>> {
        self.typed(name, Value::as_int)
    }

    pub fn get_str(&self, name: &str) -> Result<Option<&str>> {
        self.typed(name, Value::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Result<Option<bool>> {
        self.typed(name, Value::as_bool)
    }

    pub fn get_str_list(&self, name: &str) -> Result<Option<&[String]>> {
        self.typed(name, Value::as_str_list)
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => extract(value).map(Some).ok_or_else(|| {
                ResourceError::Validation(format!(
                    "attribute '{}' has unexpected type {}",
                    name,
                    value.type_name()
                ))
            }),
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.attributes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Representation {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut rep = Representation::new();
        for (k, v) in iter {
            rep.set(k, v);
        }
        rep
    }
}

impl Serialize for Representation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len()))?;
        for (name, value) in &self.attributes {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Representation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RepresentationVisitor;

        impl<'de> Visitor<'de> for RepresentationVisitor {
            type Value = Representation;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of attribute names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut rep = Representation::new();
                while let Some((name, raw)) = access.next_entry::<String, serde_json::Value>()? {
                    match Value::deserialize(raw) {
                        Ok(value) => {
                            rep.set(name, value);
                        }
                        Err(e) => tracing::trace!("Skipping attribute '{}': {}", name, e),
                    }
                }
                Ok(rep)
            }
        }

        deserializer.deserialize_map(RepresentationVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut rep = Representation::new()
            .with("state", "Idle")
            .with("title", "");
        let previous = rep.set("state", "Playing");

        assert_eq!(previous, Some(Value::from("Idle")));
        assert_eq!(rep.len(), 2);
        assert_eq!(rep.names().collect::<Vec<_>>(), vec!["state", "title"]);
        assert_eq!(rep.get_str("state").unwrap(), Some("Playing"));
    }

    #[test]
    fn test_typed_getter_absent_vs_wrong_type() {
        let rep = Representation::new().with("brightness", 40);
        assert_eq!(rep.get_int("brightness").unwrap(), Some(40));
        assert_eq!(rep.get_int("missing").unwrap(), None);
        assert!(matches!(
            rep.get_str("brightness"),
            Err(ResourceError::Validation(_))
        ));
    }

    #[test]
    fn test_serialization_keeps_order() {
        let rep = Representation::new()
            .with("zeta", 1)
            .with("alpha", true)
            .with("list", vec!["x".to_string()]);
        let json = serde_json::to_string(&rep).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":true,"list":["x"]}"#);

        let back: Representation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rep);
    }

    #[test]
    fn test_duplicate_wire_names_keep_last_value() {
        let rep: Representation = serde_json::from_str(r#"{"a":1,"a":2}"#).unwrap();
        assert_eq!(rep.len(), 1);
        assert_eq!(rep.get_int("a").unwrap(), Some(2));
    }

    #[test]
    fn test_unsupported_values_are_skipped() {
        let rep: Representation =
            serde_json::from_str(r#"{"state":"Idle","ratio":0.5,"meta":{"a":1},"select":2}"#)
                .unwrap();
        assert_eq!(rep.names().collect::<Vec<_>>(), vec!["state", "select"]);
        assert!(serde_json::from_str::<Representation>("[1, 2]").is_err());
    }

    #[test]
    fn test_remove_and_display() {
        let mut rep: Representation = vec![("mute", Value::Bool(true)), ("volume", Value::Int(3))]
            .into_iter()
            .collect();
        assert_eq!(rep.to_string(), "{mute: true, volume: 3}");
        assert_eq!(rep.remove("mute"), Some(Value::Bool(true)));
        assert!(!rep.contains("mute"));
        assert_eq!(rep.remove("mute"), None);
    }
}

//! Maps whose keys follow a pattern and which also accept `x-` extensions.
//!
//! Paths, Responses and Callback objects are plain JSON objects where every
//! non-extension key names an entry. They share this representation.

use crate::extensions::{Extensions, is_extension_key};
use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Ordered entries plus specification extensions, serialized as one object.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternedMap<T> {
    entries: IndexMap<String, T>,
    extensions: Extensions,
}

impl<T> Default for PatternedMap<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            extensions: Extensions::new(),
        }
    }
}

impl<T> PatternedMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(entries: IndexMap<String, T>, extensions: Extensions) -> Self {
        Self {
            entries,
            extensions,
        }
    }

    /// Add or replace an entry, keeping its original position on replace.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<T>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Add an `x-` extension field.
    ///
    /// # Panics
    ///
    /// Panics if `key` does not start with `x-`; see [`crate::Extensions::try_with`].
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &T)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Number of entries, extensions excluded
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}

impl<K: Into<String>, V: Into<T>, T> FromIterator<(K, V)> for PatternedMap<T> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |map, (key, value)| map.with_entry(key, value))
    }
}

impl<T: Serialize> Serialize for PatternedMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + self.extensions.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        for (key, value) in &self.extensions {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for PatternedMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PatternedVisitor(PhantomData))
    }
}

struct PatternedVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for PatternedVisitor<T> {
    type Value = PatternedMap<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of patterned fields and `x-` extensions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut patterned = PatternedMap::new();
        while let Some(key) = access.next_key::<String>()? {
            if is_extension_key(&key) {
                let value = access.next_value::<Value>()?;
                patterned.extensions.insert(key, value);
            } else {
                let entry = access.next_value::<T>()?;
                patterned.entries.insert(key, entry);
            }
        }
        Ok(patterned)
    }
}

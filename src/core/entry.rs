//! Directory entry data model: distinguished names, opaque attribute values,
//! case-insensitive attribute sets and ordered snapshots keyed by DN.

use std::{borrow::Borrow, fmt};

use indexmap::IndexMap;

/// Distinguished name. Identity is byte equality of the textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dn(String);

impl Dn
{
    pub fn new(dn: impl Into<String>) -> Self
    {
        Self(dn.into())
    }

    pub fn as_str(&self) -> &str
    {
        &self.0
    }

    /// Comma-separated components, most specific first.
    pub fn components(&self) -> impl Iterator<Item = &str>
    {
        self.0
            .split(',')
    }

    /// The DN with its first component removed, if there is one.
    pub fn parent(&self) -> Option<Dn>
    {
        self.0
            .split_once(',')
            .map(|(_, rest)| Dn::new(rest))
    }
}

impl fmt::Display for Dn
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Dn
{
    fn borrow(&self) -> &str
    {
        &self.0
    }
}

impl From<&str> for Dn
{
    fn from(s: &str) -> Self
    {
        Self(s.to_string())
    }
}

impl From<String> for Dn
{
    fn from(s: String) -> Self
    {
        Self(s)
    }
}

/// Attribute value as raw bytes; not assumed to be text.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Value(Vec<u8>);

impl Value
{
    pub fn as_bytes(&self) -> &[u8]
    {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8>
    {
        self.0
    }

    /// The value as text when it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str>
    {
        std::str::from_utf8(&self.0).ok()
    }
}

impl fmt::Debug for Value
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        match self.as_str()
        {
            Some(s) => write!(f, "{s:?}"),
            None => write!(f, "b{:?}", String::from_utf8_lossy(&self.0)),
        }
    }
}

impl From<&str> for Value
{
    fn from(s: &str) -> Self
    {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Value
{
    fn from(s: String) -> Self
    {
        Self(s.into_bytes())
    }
}

impl From<Vec<u8>> for Value
{
    fn from(bytes: Vec<u8>) -> Self
    {
        Self(bytes)
    }
}

impl From<&[u8]> for Value
{
    fn from(bytes: &[u8]) -> Self
    {
        Self(bytes.to_vec())
    }
}

/// One attribute type with its ordered values. `name` keeps the spelling
/// that was seen first.
#[derive(Debug, Clone)]
struct Attribute
{
    name: String,
    values: Vec<Value>,
}

/// Attribute types mapped to ordered value lists.
///
/// Type names compare case-insensitively. Equality compares the value lists of
/// each type (value order matters, type order does not); iteration follows
/// insertion order so rendering is stable.
#[derive(Clone, Default)]
pub struct AttributeSet
{
    attrs: IndexMap<String, Attribute>,
}

impl AttributeSet
{
    pub fn new() -> Self
    {
        Self::default()
    }

    fn key(name: &str) -> String
    {
        name.to_ascii_lowercase()
    }

    /// Append one value, creating the attribute type on first use.
    pub fn push(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    )
    {
        self.attrs
            .entry(Self::key(name))
            .or_insert_with(|| Attribute { name: name.to_string(), values: Vec::new() })
            .values
            .push(value.into());
    }

    /// Replace all values of a type, keeping its position when it exists.
    pub fn set(
        &mut self,
        name: &str,
        values: Vec<Value>,
    )
    {
        match self
            .attrs
            .get_mut(&Self::key(name))
        {
            Some(attr) => attr.values = values,
            None =>
            {
                self.attrs
                    .insert(Self::key(name), Attribute { name: name.to_string(), values });
            }
        }
    }

    /// Remove a type entirely, returning its values.
    pub fn remove(
        &mut self,
        name: &str,
    ) -> Option<Vec<Value>>
    {
        self.attrs
            .shift_remove(&Self::key(name))
            .map(|a| a.values)
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&[Value]>
    {
        self.attrs
            .get(&Self::key(name))
            .map(|a| a.values.as_slice())
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool
    {
        self.attrs
            .contains_key(&Self::key(name))
    }

    /// Number of attribute types.
    pub fn len(&self) -> usize
    {
        self.attrs
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.attrs
            .is_empty()
    }

    /// Attribute types in insertion order with their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])>
    {
        self.attrs
            .values()
            .map(|a| (a.name.as_str(), a.values.as_slice()))
    }

    /// Every (type, value) pair, types in insertion order, values in order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &Value)>
    {
        self.iter()
            .flat_map(|(name, values)| {
                values
                    .iter()
                    .map(move |v| (name, v))
            })
    }
}

impl PartialEq for AttributeSet
{
    fn eq(
        &self,
        other: &Self,
    ) -> bool
    {
        self.attrs.len() == other.attrs.len()
            && self
                .attrs
                .iter()
                .all(|(key, attr)| {
                    other
                        .attrs
                        .get(key)
                        .is_some_and(|o| o.values == attr.values)
                })
    }
}

impl Eq for AttributeSet {}

impl fmt::Debug for AttributeSet
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.debug_map()
            .entries(self.iter())
            .finish()
    }
}

impl<N, V> FromIterator<(N, V)> for AttributeSet
where
    N: AsRef<str>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self
    {
        let mut set = AttributeSet::new();
        for (name, value) in iter
        {
            set.push(name.as_ref(), value);
        }
        set
    }
}

/// A DN paired with its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry
{
    pub dn: Dn,
    pub attrs: AttributeSet,
}

impl Entry
{
    pub fn new(
        dn: impl Into<Dn>,
        attrs: AttributeSet,
    ) -> Self
    {
        Self { dn: dn.into(), attrs }
    }
}

/// Ordered DN -> attributes mapping; DNs are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot
{
    entries: IndexMap<Dn, AttributeSet>,
}

impl Snapshot
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Build from entries in the given order. A repeated DN keeps its first
    /// position and the later attribute set.
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self
    {
        let mut snapshot = Snapshot::new();
        for entry in entries
        {
            snapshot.insert(entry.dn, entry.attrs);
        }
        snapshot
    }

    /// Insert or overwrite, returning the previous attributes for `dn`.
    pub fn insert(
        &mut self,
        dn: Dn,
        attrs: AttributeSet,
    ) -> Option<AttributeSet>
    {
        self.entries
            .insert(dn, attrs)
    }

    pub fn get(
        &self,
        dn: &str,
    ) -> Option<&AttributeSet>
    {
        self.entries
            .get(dn)
    }

    pub fn contains(
        &self,
        dn: &str,
    ) -> bool
    {
        self.entries
            .contains_key(dn)
    }

    pub fn len(&self) -> usize
    {
        self.entries
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries
            .is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Dn, &AttributeSet)>
    {
        self.entries
            .iter()
    }

    pub fn dns(&self) -> impl Iterator<Item = &Dn>
    {
        self.entries
            .keys()
    }

    pub fn into_entries(self) -> impl Iterator<Item = Entry>
    {
        self.entries
            .into_iter()
            .map(|(dn, attrs)| Entry { dn, attrs })
    }
}

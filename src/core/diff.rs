//! Snapshot comparison producing add/modify/delete operation lists.

use std::fmt;

use crate::core::entry::{AttributeSet, Dn, Snapshot, Value};

/// How one attribute type changes in a modify operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta
{
    /// Replace every value of `attr` with `values`.
    Replace
    {
        attr: String, values: Vec<Value>
    },
    /// Add `values` to `attr`, creating it if needed.
    AddValues
    {
        attr: String, values: Vec<Value>
    },
    /// Remove exactly these `values` from `attr`.
    RemoveValues
    {
        attr: String, values: Vec<Value>
    },
    /// Remove `attr` with all of its values.
    RemoveAttribute
    {
        attr: String
    },
}

impl Delta
{
    pub fn attr(&self) -> &str
    {
        match self
        {
            Delta::Replace { attr, .. }
            | Delta::AddValues { attr, .. }
            | Delta::RemoveValues { attr, .. }
            | Delta::RemoveAttribute { attr } => attr,
        }
    }
}

/// Operations that turn one snapshot into another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet
{
    pub additions: Vec<(Dn, AttributeSet)>,
    pub modifications: Vec<(Dn, Vec<Delta>)>,
    pub deletions: Vec<Dn>,
}

impl ChangeSet
{
    pub fn is_empty(&self) -> bool
    {
        self.additions
            .is_empty()
            && self
                .modifications
                .is_empty()
            && self
                .deletions
                .is_empty()
    }

    pub fn summary(&self) -> ChangeSummary
    {
        ChangeSummary {
            additions: self
                .additions
                .len(),
            modifications: self
                .modifications
                .len(),
            deletions: self
                .deletions
                .len(),
        }
    }
}

/// Operation counts shown to the operator before applying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSummary
{
    pub additions: usize,
    pub modifications: usize,
    pub deletions: usize,
}

impl fmt::Display for ChangeSummary
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        write!(
            f,
            "add {}, modify {}, delete {}",
            self.additions, self.modifications, self.deletions
        )
    }
}

/// Compare `old` (what the directory holds) against `new` (what the operator
/// wants).
///
/// Additions and modifications follow `new`'s order; deletions follow `old`'s
/// order. Changed attribute types are replaced wholesale; types missing from
/// `new` are removed.
pub fn diff(
    old: &Snapshot,
    new: &Snapshot,
) -> ChangeSet
{
    let mut changes = ChangeSet::default();

    for (dn, new_attrs) in new.iter()
    {
        match old.get(dn.as_str())
        {
            None => changes
                .additions
                .push((dn.clone(), new_attrs.clone())),
            Some(old_attrs) if old_attrs == new_attrs => {}
            Some(old_attrs) =>
            {
                let deltas = attribute_deltas(old_attrs, new_attrs);
                if !deltas.is_empty()
                {
                    changes
                        .modifications
                        .push((dn.clone(), deltas));
                }
            }
        }
    }

    changes.deletions = old
        .dns()
        .filter(|dn| !new.contains(dn.as_str()))
        .cloned()
        .collect();

    changes
}

fn attribute_deltas(
    old: &AttributeSet,
    new: &AttributeSet,
) -> Vec<Delta>
{
    let mut deltas: Vec<Delta> = new
        .iter()
        .filter(|(name, values)| old.get(name) != Some(*values))
        .map(|(name, values)| Delta::Replace { attr: name.to_string(), values: values.to_vec() })
        .collect();

    deltas.extend(
        old.iter()
            .filter(|(name, _)| !new.contains(name))
            .map(|(name, _)| Delta::RemoveAttribute { attr: name.to_string() }),
    );

    deltas
}

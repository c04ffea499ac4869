//! Hierarchical ordering of entries.
//!
//! DNs are keyed by their comma-separated components in reverse (root first)
//! and compared lexicographically, so an ancestor's key is a strict prefix of
//! every descendant's key and always sorts first.

use crate::core::entry::{Dn, Entry, Snapshot};

/// Root-first component key of a DN.
pub fn dn_key(dn: &Dn) -> Vec<&str>
{
    let mut key: Vec<&str> = dn
        .components()
        .collect();
    key.reverse();
    key
}

/// Sort entries parent-before-child.
pub fn order_entries(mut entries: Vec<Entry>) -> Vec<Entry>
{
    entries.sort_by(|a, b| dn_key(&a.dn).cmp(&dn_key(&b.dn)));
    entries
}

/// A copy of the snapshot with entries in parent-before-child order.
pub fn order(snapshot: &Snapshot) -> Snapshot
{
    let entries = snapshot
        .iter()
        .map(|(dn, attrs)| Entry { dn: dn.clone(), attrs: attrs.clone() })
        .collect();
    Snapshot::from_entries(order_entries(entries))
}

/// Sort DNs child-before-parent, the only safe order for deleting a subtree.
pub fn deletion_order(mut dns: Vec<Dn>) -> Vec<Dn>
{
    dns.sort_by(|a, b| dn_key(b).cmp(&dn_key(a)));
    dns
}

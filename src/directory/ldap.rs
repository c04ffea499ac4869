//! Network backend on the synchronous `ldap3` client.

use std::collections::HashSet;

use itertools::Itertools;
use ldap3::{LdapConn, LdapConnSettings, Mod, SearchEntry};
use tracing::{debug, instrument};

use crate::{
    core::{
        diff::Delta,
        entry::{AttributeSet, Dn, Entry, Value},
    },
    directory::{BindTarget, Connector, Directory, DirectoryError, OpKind, Scope, SearchRequest},
};

/// Binds over the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct LdapConnector;

impl Connector for LdapConnector
{
    #[instrument(skip_all, fields(uri = %target.uri, identity = %target.identity()))]
    fn bind(
        &self,
        target: &BindTarget,
    ) -> Result<Box<dyn Directory>, DirectoryError>
    {
        let settings = LdapConnSettings::new()
            .set_starttls(target.starttls)
            .set_no_tls_verify(!target.tls_verify);

        let mut conn = LdapConn::with_settings(settings, &target.uri)
            .map_err(|e| DirectoryError::connect(target, e))?;

        if let Some(bind_dn) = &target.bind_dn
        {
            let bind_pw = target
                .bind_pw
                .as_deref()
                .unwrap_or("");
            conn.simple_bind(bind_dn, bind_pw)
                .and_then(|r| r.success())
                .map_err(|e| DirectoryError::connect(target, e))?;
        }

        debug!("bound");
        Ok(Box::new(LdapDirectory { conn }))
    }
}

pub struct LdapDirectory
{
    conn: LdapConn,
}

impl Drop for LdapDirectory
{
    fn drop(&mut self)
    {
        let _ = self
            .conn
            .unbind();
    }
}

fn ldap_scope(scope: Scope) -> ldap3::Scope
{
    match scope
    {
        Scope::Base => ldap3::Scope::Base,
        Scope::One => ldap3::Scope::OneLevel,
        Scope::Sub => ldap3::Scope::Subtree,
    }
}

/// Values of one attribute as the set `ldap3` expects. Duplicates and value
/// order do not survive this; the protocol treats values as a set.
fn value_set(values: &[Value]) -> HashSet<Vec<u8>>
{
    values
        .iter()
        .map(|v| {
            v.as_bytes()
                .to_vec()
        })
        .collect()
}

/// Server entries come back as hash maps; present `objectClass` first and the
/// rest alphabetically so renders are stable between runs.
fn to_entry(raw: SearchEntry) -> Entry
{
    let names: Vec<&String> = raw
        .attrs
        .keys()
        .chain(
            raw.bin_attrs
                .keys(),
        )
        .sorted_by_key(|name| (!name.eq_ignore_ascii_case("objectClass"), name.to_ascii_lowercase()))
        .dedup_by(|a, b| a.eq_ignore_ascii_case(b))
        .collect();

    let mut attrs = AttributeSet::new();
    for name in names
    {
        for text in raw
            .attrs
            .get(name)
            .into_iter()
            .flatten()
        {
            attrs.push(name, text.as_str());
        }
        for bytes in raw
            .bin_attrs
            .get(name)
            .into_iter()
            .flatten()
        {
            attrs.push(name, bytes.as_slice());
        }
    }

    Entry::new(raw.dn.as_str(), attrs)
}

impl Directory for LdapDirectory
{
    #[instrument(skip(self), fields(base = %request.base))]
    fn search(
        &mut self,
        request: &SearchRequest,
    ) -> Result<Vec<Entry>, DirectoryError>
    {
        let (entries, _res) = self
            .conn
            .search(request.base.as_str(), ldap_scope(request.scope), &request.filter, vec!["*"])
            .and_then(|r| r.success())
            .map_err(|e| DirectoryError::search(request, e))?;

        debug!(count = entries.len(), "search complete");
        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(to_entry)
            .collect())
    }

    #[instrument(skip(self, attrs))]
    fn add(
        &mut self,
        dn: &Dn,
        attrs: &AttributeSet,
    ) -> Result<(), DirectoryError>
    {
        let attrs: Vec<(Vec<u8>, HashSet<Vec<u8>>)> = attrs
            .iter()
            .map(|(name, values)| (name.as_bytes().to_vec(), value_set(values)))
            .collect();

        self.conn
            .add(dn.as_str(), attrs)
            .and_then(|r| r.success())
            .map(|_| ())
            .map_err(|e| DirectoryError::operation(OpKind::Add, dn, e))
    }

    #[instrument(skip(self, deltas))]
    fn modify(
        &mut self,
        dn: &Dn,
        deltas: &[Delta],
    ) -> Result<(), DirectoryError>
    {
        let mods: Vec<Mod<Vec<u8>>> = deltas
            .iter()
            .map(|delta| {
                let name = delta
                    .attr()
                    .as_bytes()
                    .to_vec();
                match delta
                {
                    Delta::Replace { values, .. } => Mod::Replace(name, value_set(values)),
                    Delta::AddValues { values, .. } => Mod::Add(name, value_set(values)),
                    Delta::RemoveValues { values, .. } => Mod::Delete(name, value_set(values)),
                    // An empty value set deletes the whole attribute.
                    Delta::RemoveAttribute { .. } => Mod::Delete(name, HashSet::new()),
                }
            })
            .collect();

        self.conn
            .modify(dn.as_str(), mods)
            .and_then(|r| r.success())
            .map(|_| ())
            .map_err(|e| DirectoryError::operation(OpKind::Modify, dn, e))
    }

    #[instrument(skip(self))]
    fn delete(
        &mut self,
        dn: &Dn,
    ) -> Result<(), DirectoryError>
    {
        self.conn
            .delete(dn.as_str())
            .and_then(|r| r.success())
            .map(|_| ())
            .map_err(|e| DirectoryError::operation(OpKind::Delete, dn, e))
    }
}

#[cfg(test)]
mod tests
{
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn server_entry_puts_object_class_first()
    {
        let raw = SearchEntry {
            dn: "cn=a,o=x".into(),
            attrs: HashMap::from([
                ("sn".to_string(), vec!["A".to_string()]),
                ("objectClass".to_string(), vec!["top".to_string(), "person".to_string()]),
                ("cn".to_string(), vec!["a".to_string()]),
            ]),
            bin_attrs: HashMap::from([("jpegPhoto".to_string(), vec![vec![0xff, 0xd8]])]),
        };
        let entry = to_entry(raw);

        let names: Vec<&str> = entry
            .attrs
            .iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["objectClass", "cn", "jpegPhoto", "sn"]);
        assert_eq!(
            entry
                .attrs
                .get("objectclass")
                .map(|v| v.len()),
            Some(2)
        );
    }

    #[test]
    fn scopes_map_to_protocol_scopes()
    {
        assert!(matches!(ldap_scope(Scope::One), ldap3::Scope::OneLevel));
        assert!(matches!(ldap_scope(Scope::Sub), ldap3::Scope::Subtree));
    }
}

//! In-process directory.
//!
//! Clones share state, so a test can hand one clone to the workflow and
//! inspect the other afterwards.

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use tracing::trace;

use crate::{
    core::{
        diff::Delta,
        entry::{AttributeSet, Dn, Entry, Snapshot, Value},
    },
    directory::{BindTarget, Connector, Directory, DirectoryError, OpKind, Scope, SearchRequest},
};

#[derive(Debug, Default)]
struct State
{
    entries: Snapshot,
    strict: bool,
    refuse_bind: Option<String>,
    failures: HashSet<(OpKind, Dn)>,
    log: Vec<(OpKind, Dn)>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory
{
    state: Rc<RefCell<State>>,
}

impl MemoryDirectory
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn with_entries(entries: Snapshot) -> Self
    {
        let dir = Self::new();
        dir.state
            .borrow_mut()
            .entries = entries;
        dir
    }

    /// Refuse to add under a missing parent or delete an entry with children,
    /// like a real server.
    pub fn strict(self) -> Self
    {
        self.state
            .borrow_mut()
            .strict = true;
        self
    }

    /// Make every bind fail with `reason`.
    pub fn refuse_bind(
        &self,
        reason: impl Into<String>,
    )
    {
        self.state
            .borrow_mut()
            .refuse_bind = Some(reason.into());
    }

    /// Make the next and every later `op` on `dn` fail.
    pub fn fail_on(
        &self,
        op: OpKind,
        dn: impl Into<Dn>,
    )
    {
        self.state
            .borrow_mut()
            .failures
            .insert((op, dn.into()));
    }

    /// Current contents.
    pub fn entries(&self) -> Snapshot
    {
        self.state
            .borrow()
            .entries
            .clone()
    }

    /// Every mutation attempted so far, failed ones included.
    pub fn operations(&self) -> Vec<(OpKind, Dn)>
    {
        self.state
            .borrow()
            .log
            .clone()
    }

    fn begin(
        &self,
        op: OpKind,
        dn: &Dn,
    ) -> Result<(), DirectoryError>
    {
        let mut state = self
            .state
            .borrow_mut();
        state
            .log
            .push((op, dn.clone()));
        if state
            .failures
            .contains(&(op, dn.clone()))
        {
            return Err(DirectoryError::operation(op, dn, "Server is unwilling to perform"));
        }
        Ok(())
    }
}

impl Connector for MemoryDirectory
{
    fn bind(
        &self,
        target: &BindTarget,
    ) -> Result<Box<dyn Directory>, DirectoryError>
    {
        if let Some(reason) = &self
            .state
            .borrow()
            .refuse_bind
        {
            return Err(DirectoryError::connect(target, reason));
        }
        Ok(Box::new(self.clone()))
    }
}

/// Minimal filter support: match-all, presence `(a=*)` and equality `(a=v)`.
enum Filter
{
    All,
    Present(String),
    Equals(String, Value),
}

impl Filter
{
    fn parse(text: &str) -> Option<Filter>
    {
        let text = text.trim();
        if text.is_empty()
        {
            return Some(Filter::All);
        }
        let inner = text
            .strip_prefix('(')?
            .strip_suffix(')')?;
        if inner.contains(['(', ')', '&', '|', '!'])
        {
            return None;
        }
        let (attr, value) = inner.split_once('=')?;
        match value
        {
            "*" if attr.eq_ignore_ascii_case("objectClass") => Some(Filter::All),
            "*" => Some(Filter::Present(attr.to_string())),
            _ => Some(Filter::Equals(attr.to_string(), Value::from(value))),
        }
    }

    fn matches(
        &self,
        attrs: &AttributeSet,
    ) -> bool
    {
        match self
        {
            Filter::All => true,
            Filter::Present(attr) => attrs.contains(attr),
            Filter::Equals(attr, value) => attrs
                .get(attr)
                .is_some_and(|values| values.contains(value)),
        }
    }
}

fn in_scope(
    dn: &Dn,
    base: &Dn,
    scope: Scope,
) -> bool
{
    if base
        .as_str()
        .is_empty()
    {
        return match scope
        {
            Scope::Base => false,
            Scope::One => dn
                .parent()
                .is_none(),
            Scope::Sub => true,
        };
    }
    match scope
    {
        Scope::Base => dn == base,
        Scope::One => dn.parent().as_ref() == Some(base),
        Scope::Sub =>
        {
            dn == base
                || dn
                    .as_str()
                    .strip_suffix(base.as_str())
                    .is_some_and(|head| head.ends_with(','))
        }
    }
}

impl Directory for MemoryDirectory
{
    fn search(
        &mut self,
        request: &SearchRequest,
    ) -> Result<Vec<Entry>, DirectoryError>
    {
        let filter = Filter::parse(&request.filter)
            .ok_or_else(|| DirectoryError::search(request, "Bad search filter"))?;
        let state = self
            .state
            .borrow();

        let base = &request.base;
        if !base
            .as_str()
            .is_empty()
            && !state
                .entries
                .contains(base.as_str())
        {
            return Err(DirectoryError::search(request, "No such object"));
        }

        Ok(state
            .entries
            .iter()
            .filter(|(dn, attrs)| in_scope(dn, base, request.scope) && filter.matches(attrs))
            .map(|(dn, attrs)| Entry { dn: dn.clone(), attrs: attrs.clone() })
            .collect())
    }

    fn add(
        &mut self,
        dn: &Dn,
        attrs: &AttributeSet,
    ) -> Result<(), DirectoryError>
    {
        self.begin(OpKind::Add, dn)?;
        let mut state = self
            .state
            .borrow_mut();

        if state
            .entries
            .contains(dn.as_str())
        {
            return Err(DirectoryError::operation(OpKind::Add, dn, "Already exists"));
        }
        if state.strict
            && let Some(parent) = dn.parent()
            && !state
                .entries
                .contains(parent.as_str())
        {
            return Err(DirectoryError::operation(OpKind::Add, dn, "No such object"));
        }

        trace!(%dn, "add");
        state
            .entries
            .insert(dn.clone(), attrs.clone());
        Ok(())
    }

    fn modify(
        &mut self,
        dn: &Dn,
        deltas: &[Delta],
    ) -> Result<(), DirectoryError>
    {
        self.begin(OpKind::Modify, dn)?;
        let mut state = self
            .state
            .borrow_mut();

        let Some(current) = state
            .entries
            .get(dn.as_str())
        else
        {
            return Err(DirectoryError::operation(OpKind::Modify, dn, "No such object"));
        };

        // Deltas apply atomically: work on a copy.
        let mut attrs = current.clone();
        for delta in deltas
        {
            apply_delta(&mut attrs, delta)
                .map_err(|reason| DirectoryError::operation(OpKind::Modify, dn, reason))?;
        }

        trace!(%dn, deltas = deltas.len(), "modify");
        state
            .entries
            .insert(dn.clone(), attrs);
        Ok(())
    }

    fn delete(
        &mut self,
        dn: &Dn,
    ) -> Result<(), DirectoryError>
    {
        self.begin(OpKind::Delete, dn)?;
        let mut state = self
            .state
            .borrow_mut();

        if !state
            .entries
            .contains(dn.as_str())
        {
            return Err(DirectoryError::operation(OpKind::Delete, dn, "No such object"));
        }
        if state.strict
            && state
                .entries
                .dns()
                .any(|other| other.parent().as_ref() == Some(dn))
        {
            return Err(DirectoryError::operation(
                OpKind::Delete,
                dn,
                "Operation not allowed on non-leaf",
            ));
        }

        trace!(%dn, "delete");
        let remaining = std::mem::take(&mut state.entries)
            .into_entries()
            .filter(|e| &e.dn != dn);
        state.entries = Snapshot::from_entries(remaining);
        Ok(())
    }
}

fn apply_delta(
    attrs: &mut AttributeSet,
    delta: &Delta,
) -> Result<(), &'static str>
{
    match delta
    {
        Delta::Replace { attr, values } if values.is_empty() =>
        {
            attrs.remove(attr);
        }
        Delta::Replace { attr, values } => attrs.set(attr, values.clone()),
        Delta::AddValues { attr, values } =>
        {
            for value in values
            {
                attrs.push(attr, value.clone());
            }
        }
        Delta::RemoveValues { attr, values } =>
        {
            let current = attrs
                .get(attr)
                .ok_or("No such attribute")?;
            let kept: Vec<Value> = current
                .iter()
                .filter(|v| !values.contains(v))
                .cloned()
                .collect();
            if kept.is_empty()
            {
                attrs.remove(attr);
            }
            else
            {
                attrs.set(attr, kept);
            }
        }
        Delta::RemoveAttribute { attr } =>
        {
            attrs
                .remove(attr)
                .ok_or("No such attribute")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn seeded() -> MemoryDirectory
    {
        MemoryDirectory::with_entries(Snapshot::from_entries([
            Entry::new("o=x", [("o", "x")].into_iter().collect()),
            Entry::new("ou=a,o=x", [("ou", "a")].into_iter().collect()),
            Entry::new("cn=1,ou=a,o=x", [("cn", "1"), ("mail", "1@x")].into_iter().collect()),
            Entry::new("ou=b,o=x", [("ou", "b")].into_iter().collect()),
        ]))
    }

    fn found(
        dir: &mut MemoryDirectory,
        request: SearchRequest,
    ) -> Vec<String>
    {
        dir.search(&request)
            .unwrap()
            .into_iter()
            .map(|e| e.dn.to_string())
            .collect()
    }

    #[test]
    fn search_honours_scope()
    {
        let mut dir = seeded();

        assert_eq!(found(&mut dir, SearchRequest::new("o=x", Scope::Base)), vec!["o=x"]);
        assert_eq!(found(&mut dir, SearchRequest::new("o=x", Scope::One)), vec![
            "ou=a,o=x", "ou=b,o=x"
        ]);
        assert_eq!(found(&mut dir, SearchRequest::new("ou=a,o=x", Scope::Sub)), vec![
            "ou=a,o=x",
            "cn=1,ou=a,o=x"
        ]);
    }

    #[test]
    fn search_filters_and_errors()
    {
        let mut dir = seeded();

        assert_eq!(
            found(&mut dir, SearchRequest::new("o=x", Scope::Sub).with_filter("(mail=*)")),
            vec!["cn=1,ou=a,o=x"]
        );
        assert_eq!(
            found(&mut dir, SearchRequest::new("o=x", Scope::Sub).with_filter("(ou=b)")),
            vec!["ou=b,o=x"]
        );
        assert!(matches!(
            dir.search(&SearchRequest::new("o=nowhere", Scope::Sub)),
            Err(DirectoryError::Search { .. })
        ));
        assert!(matches!(
            dir.search(&SearchRequest::new("o=x", Scope::Sub).with_filter("(&(a=b)(c=d))")),
            Err(DirectoryError::Search { .. })
        ));
    }

    #[test]
    fn modify_applies_every_delta_kind()
    {
        let mut dir = seeded();
        let dn = Dn::from("cn=1,ou=a,o=x");
        dir.modify(&dn, &[
            Delta::AddValues { attr: "mail".into(), values: vec![Value::from("2@x")] },
            Delta::RemoveValues { attr: "mail".into(), values: vec![Value::from("1@x")] },
            Delta::Replace { attr: "sn".into(), values: vec![Value::from("one")] },
            Delta::RemoveAttribute { attr: "CN".into() },
        ])
        .unwrap();

        let expected: AttributeSet = [("mail", "2@x"), ("sn", "one")]
            .into_iter()
            .collect();
        assert_eq!(
            dir.entries()
                .get("cn=1,ou=a,o=x"),
            Some(&expected)
        );
    }

    #[test]
    fn failed_modify_leaves_entry_untouched()
    {
        let mut dir = seeded();
        let before = dir.entries();
        let err = dir
            .modify(&Dn::from("ou=b,o=x"), &[
                Delta::Replace { attr: "description".into(), values: vec![Value::from("d")] },
                Delta::RemoveAttribute { attr: "missing".into() },
            ])
            .unwrap_err();

        assert!(matches!(err, DirectoryError::Operation { op: OpKind::Modify, .. }));
        assert_eq!(dir.entries(), before);
    }

    #[test]
    fn strict_mode_rejects_non_leaf_delete_and_orphan_add()
    {
        let mut dir = seeded().strict();

        assert!(
            dir.delete(&Dn::from("ou=a,o=x"))
                .is_err()
        );
        assert!(
            dir.add(&Dn::from("cn=2,ou=c,o=x"), &AttributeSet::new())
                .is_err()
        );
        dir.delete(&Dn::from("cn=1,ou=a,o=x"))
            .unwrap();
        dir.delete(&Dn::from("ou=a,o=x"))
            .unwrap();
        assert_eq!(
            dir.entries()
                .len(),
            2
        );
    }

    #[test]
    fn injected_failures_and_operation_log()
    {
        let mut dir = seeded();
        dir.fail_on(OpKind::Add, "cn=2,o=x");

        assert!(
            dir.add(&Dn::from("cn=2,o=x"), &AttributeSet::new())
                .is_err()
        );
        dir.add(&Dn::from("cn=3,o=x"), &AttributeSet::new())
            .unwrap();

        assert_eq!(dir.operations(), vec![
            (OpKind::Add, Dn::from("cn=2,o=x")),
            (OpKind::Add, Dn::from("cn=3,o=x"))
        ]);
        assert!(
            !dir.entries()
                .contains("cn=2,o=x")
        );
    }

    #[test]
    fn refused_bind_is_a_connect_error()
    {
        let dir = MemoryDirectory::new();
        dir.refuse_bind("Can't contact LDAP server");

        let target = BindTarget { uri: "ldap://nowhere".into(), ..Default::default() };
        assert!(matches!(dir.bind(&target), Err(DirectoryError::Connect { .. })));
    }
}

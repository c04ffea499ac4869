//! Unit/entity addressing: `people alice` becomes a base DN, scope and filter.

use std::collections::BTreeMap;

use crate::directory::{MATCH_ALL, Scope, SearchRequest};

/// RDN attribute used for entities when a unit has no entry in
/// `rdn_attributes`.
pub const DEFAULT_RDN: &str = "cn";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError
{
    #[error("nothing to address: give a unit or --base")]
    NoBase,

    #[error("{0:?} cannot be used inside a DN component")]
    InvalidName(String),
}

/// What the operator typed, before resolution.
#[derive(Debug, Clone, Default)]
pub struct Target<'a>
{
    pub unit: Option<&'a str>,
    pub entity: Option<&'a str>,
    pub recursive: bool,
    pub base: Option<&'a str>,
    pub scope: Option<Scope>,
    pub filter: Option<&'a str>,
}

fn checked(name: &str) -> Result<&str, TargetError>
{
    const SPECIAL: [char; 9] = [',', '+', '=', '"', '\\', '<', '>', ';', '#'];
    if name.is_empty() || name.contains(SPECIAL)
    {
        return Err(TargetError::InvalidName(name.to_string()));
    }
    Ok(name)
}

impl Target<'_>
{
    /// Resolve against the profile's suffix.
    ///
    /// Base: `--base` if given, else `ou=<unit>,<suffix>`, prefixed with
    /// `<rdn>=<entity>,` for an entity. Scope: `--scope`, else subtree when
    /// recursive, base for an entity, one level otherwise.
    pub fn resolve(
        &self,
        suffix: Option<&str>,
        rdn_attributes: &BTreeMap<String, String>,
    ) -> Result<SearchRequest, TargetError>
    {
        let base = match (self.base, self.unit)
        {
            (Some(base), _) => base.to_string(),
            (None, Some(unit)) =>
            {
                let unit = checked(unit)?;
                let mut base = format!("ou={unit}");
                if let Some(suffix) = suffix.filter(|s| !s.is_empty())
                {
                    base = format!("{base},{suffix}");
                }
                if let Some(entity) = self.entity
                {
                    let rdn = rdn_attributes
                        .get(unit)
                        .map(String::as_str)
                        .unwrap_or(DEFAULT_RDN);
                    base = format!("{rdn}={},{base}", checked(entity)?);
                }
                base
            }
            (None, None) => return Err(TargetError::NoBase),
        };

        let scope = self
            .scope
            .unwrap_or(if self.recursive
            {
                Scope::Sub
            }
            else if self.entity.is_some()
            {
                Scope::Base
            }
            else
            {
                Scope::One
            });

        let filter = self
            .filter
            .filter(|f| {
                !f.trim()
                    .is_empty()
            })
            .unwrap_or(MATCH_ALL);

        Ok(SearchRequest::new(base, scope).with_filter(filter))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn rdns() -> BTreeMap<String, String>
    {
        BTreeMap::from([("people".to_string(), "uid".to_string())])
    }

    #[test]
    fn unit_lists_one_level()
    {
        let req = Target { unit: Some("hosts"), ..Default::default() }
            .resolve(Some("o=tuna"), &rdns())
            .unwrap();
        assert_eq!(req, SearchRequest::new("ou=hosts,o=tuna", Scope::One));
    }

    #[test]
    fn entity_uses_unit_rdn_and_base_scope()
    {
        let person = Target { unit: Some("people"), entity: Some("alice"), ..Default::default() }
            .resolve(Some("o=tuna"), &rdns())
            .unwrap();
        assert_eq!(person.base.as_str(), "uid=alice,ou=people,o=tuna");
        assert_eq!(person.scope, Scope::Base);

        let host = Target { unit: Some("hosts"), entity: Some("web"), recursive: true, ..Default::default() }
            .resolve(Some("o=tuna"), &rdns())
            .unwrap();
        assert_eq!(host.base.as_str(), "cn=web,ou=hosts,o=tuna");
        assert_eq!(host.scope, Scope::Sub);
    }

    #[test]
    fn explicit_base_scope_and_filter_win()
    {
        let req = Target {
            unit: Some("people"),
            base: Some("dc=example,dc=org"),
            scope: Some(Scope::Base),
            filter: Some("(uid=bob)"),
            ..Default::default()
        }
        .resolve(Some("o=tuna"), &rdns())
        .unwrap();

        assert_eq!(req, SearchRequest::new("dc=example,dc=org", Scope::Base).with_filter("(uid=bob)"));
    }

    #[test]
    fn missing_suffix_leaves_bare_unit()
    {
        let req = Target { unit: Some("groups"), ..Default::default() }
            .resolve(None, &BTreeMap::new())
            .unwrap();
        assert_eq!(req.base.as_str(), "ou=groups");
    }

    #[test]
    fn bad_names_and_missing_base_are_rejected()
    {
        assert_eq!(
            Target::default().resolve(Some("o=tuna"), &rdns()),
            Err(TargetError::NoBase)
        );
        assert_eq!(
            Target { unit: Some("people"), entity: Some("a,b"), ..Default::default() }
                .resolve(Some("o=tuna"), &rdns()),
            Err(TargetError::InvalidName("a,b".into()))
        );
    }
}

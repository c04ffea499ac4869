//! Directory collaborator: binding, searching and the three mutations.
//!
//! The workflow only talks to these traits. [`ldap`] is the network backend,
//! [`memory`] an in-process directory for tests.

pub mod ldap;
pub mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{
    diff::Delta,
    entry::{AttributeSet, Dn, Entry},
};

/// Default search filter matching every entry.
pub const MATCH_ALL: &str = "(objectClass=*)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scope
{
    /// Only the base entry itself
    Base,
    /// Direct children of the base
    #[default]
    One,
    /// The base and everything below it
    Sub,
}

impl fmt::Display for Scope
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.write_str(match self
        {
            Scope::Base => "base",
            Scope::One => "one",
            Scope::Sub => "sub",
        })
    }
}

/// Where and as whom to bind.
#[derive(Clone, Default)]
pub struct BindTarget
{
    pub uri: String,
    /// Anonymous bind when `None`.
    pub bind_dn: Option<String>,
    pub bind_pw: Option<String>,
    pub starttls: bool,
    pub tls_verify: bool,
}

impl BindTarget
{
    /// Identity for messages; never includes the password.
    pub fn identity(&self) -> &str
    {
        self.bind_dn
            .as_deref()
            .unwrap_or("anonymous")
    }
}

impl fmt::Debug for BindTarget
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.debug_struct("BindTarget")
            .field("uri", &self.uri)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_pw",
                &self
                    .bind_pw
                    .as_ref()
                    .map(|_| "<redacted>"),
            )
            .field("starttls", &self.starttls)
            .field("tls_verify", &self.tls_verify)
            .finish()
    }
}

/// One search: base, scope and filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest
{
    pub base: Dn,
    pub scope: Scope,
    pub filter: String,
}

impl SearchRequest
{
    pub fn new(
        base: impl Into<Dn>,
        scope: Scope,
    ) -> Self
    {
        Self { base: base.into(), scope, filter: MATCH_ALL.to_string() }
    }

    pub fn with_filter(
        mut self,
        filter: impl Into<String>,
    ) -> Self
    {
        self.filter = filter.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind
{
    Add,
    Modify,
    Delete,
}

impl fmt::Display for OpKind
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.write_str(match self
        {
            OpKind::Add => "add",
            OpKind::Modify => "modify",
            OpKind::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError
{
    #[error("cannot bind to {uri} as {identity}: {reason}")]
    Connect
    {
        uri: String, identity: String, reason: String
    },

    #[error("search under {base:?} ({scope}, {filter}) failed: {reason}")]
    Search
    {
        base: String, scope: Scope, filter: String, reason: String
    },

    #[error("Failed to {op} {dn}:\n    {reason}")]
    Operation
    {
        op: OpKind, dn: Dn, reason: String
    },
}

impl DirectoryError
{
    pub fn connect(
        target: &BindTarget,
        reason: impl fmt::Display,
    ) -> Self
    {
        DirectoryError::Connect {
            uri: target
                .uri
                .clone(),
            identity: target
                .identity()
                .to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn search(
        request: &SearchRequest,
        reason: impl fmt::Display,
    ) -> Self
    {
        DirectoryError::Search {
            base: request
                .base
                .to_string(),
            scope: request.scope,
            filter: request
                .filter
                .clone(),
            reason: reason.to_string(),
        }
    }

    pub fn operation(
        op: OpKind,
        dn: &Dn,
        reason: impl fmt::Display,
    ) -> Self
    {
        DirectoryError::Operation { op, dn: dn.clone(), reason: reason.to_string() }
    }
}

/// A bound connection.
pub trait Directory
{
    /// Entries matching the request, in the order the server returned them.
    fn search(
        &mut self,
        request: &SearchRequest,
    ) -> Result<Vec<Entry>, DirectoryError>;

    fn add(
        &mut self,
        dn: &Dn,
        attrs: &AttributeSet,
    ) -> Result<(), DirectoryError>;

    fn modify(
        &mut self,
        dn: &Dn,
        deltas: &[Delta],
    ) -> Result<(), DirectoryError>;

    fn delete(
        &mut self,
        dn: &Dn,
    ) -> Result<(), DirectoryError>;
}

/// Produces bound connections.
pub trait Connector
{
    fn bind(
        &self,
        target: &BindTarget,
    ) -> Result<Box<dyn Directory>, DirectoryError>;
}

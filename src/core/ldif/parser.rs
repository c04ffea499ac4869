//! LDIF deserialization into a [`Snapshot`].

use std::collections::HashMap;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{
    entry::{AttributeSet, Dn, Snapshot},
    ldif::{
        MalformedKind, MalformedLdif,
        fold::{LogicalLine, unfold},
    },
};

/// What to do when the same DN is declared twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateDn
{
    /// Fail with [`MalformedKind::DuplicateDn`].
    #[default]
    Reject,
    /// Keep the first position and the later block's attributes.
    LastWins,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions
{
    pub duplicate_dn: DuplicateDn,
}

#[derive(Debug, Clone, Default)]
pub struct Parser
{
    options: ParseOptions,
}

/// A split `name: value` line.
struct AttrLine<'a>
{
    name: &'a str,
    value: Vec<u8>,
}

impl Parser
{
    pub fn new(options: ParseOptions) -> Self
    {
        Self { options }
    }

    /// Parse content records. Comments (`#`) and a leading `version:` line are
    /// skipped; records are separated by blank lines.
    pub fn parse(
        &self,
        text: &str,
    ) -> Result<Snapshot, MalformedLdif>
    {
        let lines = unfold(text)?;
        let mut snapshot = Snapshot::new();
        let mut first_seen: HashMap<Dn, usize> = HashMap::new();
        let mut current: Option<(Dn, usize, AttributeSet)> = None;
        let mut seen_record = false;

        for LogicalLine { line, text } in &lines
        {
            let line = *line;
            if text.starts_with('#')
            {
                continue;
            }

            if text.is_empty()
            {
                if let Some((dn, at, attrs)) = current.take()
                {
                    self.finish(&mut snapshot, &mut first_seen, dn, at, attrs)?;
                }
                continue;
            }

            let attr = split_line(text, line)?;
            match current.as_mut()
            {
                None =>
                {
                    if !seen_record && attr.name.eq_ignore_ascii_case("version")
                    {
                        seen_record = true;
                        continue;
                    }
                    seen_record = true;
                    if !attr.name.eq_ignore_ascii_case("dn")
                    {
                        return Err(MalformedLdif { line, kind: MalformedKind::MissingDn });
                    }
                    let dn = String::from_utf8(attr.value)
                        .map_err(|_| MalformedLdif { line, kind: MalformedKind::DnNotUtf8 })?;
                    current = Some((Dn::new(dn), line, AttributeSet::new()));
                }
                Some((_, _, attrs)) =>
                {
                    if attr.name.eq_ignore_ascii_case("dn")
                    {
                        return Err(MalformedLdif { line, kind: MalformedKind::UnexpectedDn });
                    }
                    if attr.name.eq_ignore_ascii_case("changetype")
                    {
                        return Err(MalformedLdif { line, kind: MalformedKind::ChangeRecord });
                    }
                    attrs.push(attr.name, attr.value);
                }
            }
        }

        if let Some((dn, at, attrs)) = current.take()
        {
            self.finish(&mut snapshot, &mut first_seen, dn, at, attrs)?;
        }

        Ok(snapshot)
    }

    fn finish(
        &self,
        snapshot: &mut Snapshot,
        first_seen: &mut HashMap<Dn, usize>,
        dn: Dn,
        at: usize,
        attrs: AttributeSet,
    ) -> Result<(), MalformedLdif>
    {
        if let Some(&first) = first_seen.get(&dn)
        {
            match self
                .options
                .duplicate_dn
            {
                DuplicateDn::Reject =>
                {
                    return Err(MalformedLdif {
                        line: at,
                        kind: MalformedKind::DuplicateDn { dn: dn.to_string(), first },
                    });
                }
                DuplicateDn::LastWins =>
                {
                    trace!(%dn, first, at, "later block replaces earlier one");
                }
            }
        }
        else
        {
            first_seen.insert(dn.clone(), at);
        }

        snapshot.insert(dn, attrs);
        Ok(())
    }
}

/// Split `name: value`, `name:: base64` or `name:< url`.
///
/// Exactly one space after the separator is consumed; any further leading
/// spaces belong to the value.
fn split_line(
    text: &str,
    line: usize,
) -> Result<AttrLine<'_>, MalformedLdif>
{
    let invalid = || MalformedLdif { line, kind: MalformedKind::InvalidLine(text.to_string()) };

    let (name, rest) = text
        .split_once(':')
        .ok_or_else(invalid)?;
    if name.is_empty()
        || name
            .chars()
            .any(char::is_whitespace)
    {
        return Err(invalid());
    }

    let value = if let Some(encoded) = rest.strip_prefix(':')
    {
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| MalformedLdif { line, kind: MalformedKind::InvalidBase64(e.to_string()) })?
    }
    else if rest.starts_with('<')
    {
        return Err(MalformedLdif { line, kind: MalformedKind::UrlValue });
    }
    else
    {
        rest.strip_prefix(' ')
            .unwrap_or(rest)
            .as_bytes()
            .to_vec()
    };

    Ok(AttrLine { name, value })
}

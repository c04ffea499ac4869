//! LDIF serialization.

use std::io::{self, Write};

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::core::{
    entry::{AttributeSet, Dn, Entry, Snapshot},
    ldif::fold::fold,
};

/// Default fold limit in display columns.
pub const DEFAULT_FOLD_WIDTH: usize = 76;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding
{
    #[default]
    Lf,
    CrLf,
}

impl LineEnding
{
    pub fn as_str(self) -> &'static str
    {
        match self
        {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LdifOptions
{
    /// Maximum display width of a physical line; 0 disables folding.
    pub fold_width: usize,
    pub line_ending: LineEnding,
}

impl Default for LdifOptions
{
    fn default() -> Self
    {
        Self { fold_width: DEFAULT_FOLD_WIDTH, line_ending: LineEnding::Lf }
    }
}

/// Whether a value has to be base64-encoded to survive as one LDIF line.
pub fn needs_base64(value: &[u8]) -> bool
{
    match std::str::from_utf8(value)
    {
        Ok(text) => text.contains(['\r', '\n']),
        Err(_) => true,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Writer
{
    options: LdifOptions,
}

impl Writer
{
    pub fn new(options: LdifOptions) -> Self
    {
        Self { options }
    }

    /// Render entries in the order given; each entry ends with a blank line.
    pub fn render<'a>(
        &self,
        entries: impl IntoIterator<Item = (&'a Dn, &'a AttributeSet)>,
    ) -> String
    {
        let mut out = String::new();
        for (dn, attrs) in entries
        {
            self.push_line(&mut out, "dn", dn.as_str().as_bytes());
            for (name, value) in attrs.pairs()
            {
                self.push_line(&mut out, name, value.as_bytes());
            }
            out.push_str(
                self.options
                    .line_ending
                    .as_str(),
            );
        }
        out
    }

    pub fn render_snapshot(
        &self,
        snapshot: &Snapshot,
    ) -> String
    {
        self.render(snapshot.iter())
    }

    pub fn render_entries(
        &self,
        entries: &[Entry],
    ) -> String
    {
        self.render(
            entries
                .iter()
                .map(|e| (&e.dn, &e.attrs)),
        )
    }

    /// Stream a snapshot to `w`.
    pub fn write_to(
        &self,
        snapshot: &Snapshot,
        w: &mut dyn Write,
    ) -> io::Result<()>
    {
        w.write_all(
            self.render_snapshot(snapshot)
                .as_bytes(),
        )
    }

    fn push_line(
        &self,
        out: &mut String,
        name: &str,
        value: &[u8],
    )
    {
        let line = match std::str::from_utf8(value)
        {
            Ok(text) if !needs_base64(value) => format!("{name}: {text}"),
            _ => format!("{name}:: {}", STANDARD.encode(value)),
        };

        let eol = self
            .options
            .line_ending
            .as_str();
        for physical in fold(&line, self.options.fold_width)
        {
            out.push_str(&physical);
            out.push_str(eol);
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::entry::Value;

    fn snapshot(entries: Vec<(&str, AttributeSet)>) -> Snapshot
    {
        Snapshot::from_entries(
            entries
                .into_iter()
                .map(|(dn, attrs)| Entry::new(dn, attrs)),
        )
    }

    #[test]
    fn plain_values_use_single_colon()
    {
        let s = snapshot(vec![(
            "cn=a,o=x",
            [("objectClass", "person"), ("cn", "a"), ("mail", "a@x")]
                .into_iter()
                .collect(),
        )]);

        let text = Writer::default().render_snapshot(&s);
        assert_eq!(text, "dn: cn=a,o=x\nobjectClass: person\ncn: a\nmail: a@x\n\n");
    }

    #[test]
    fn line_feed_triggers_base64()
    {
        let mut attrs = AttributeSet::new();
        attrs.push("description", "two\nlines");
        let text = Writer::default().render_snapshot(&snapshot(vec![("cn=a,o=x", attrs)]));

        assert!(text.contains("description:: dHdvCmxpbmVz\n"));
    }

    #[test]
    fn binary_values_are_base64()
    {
        let mut attrs = AttributeSet::new();
        attrs.push("jpegPhoto", Value::from(vec![0xff, 0xd8, 0xff]));
        let text = Writer::default().render_snapshot(&snapshot(vec![("cn=a,o=x", attrs)]));

        assert!(text.contains("jpegPhoto:: /9j/\n"));
    }

    #[test]
    fn needs_base64_is_content_based()
    {
        assert!(!needs_base64(b"plain ascii"));
        assert!(!needs_base64(" leading space".as_bytes()));
        assert!(!needs_base64("清华".as_bytes()));
        assert!(needs_base64(b"cr\rhere"));
        assert!(needs_base64(&[0xc3, 0x28]));
    }

    #[test]
    fn crlf_and_folding_options()
    {
        let mut attrs = AttributeSet::new();
        attrs.push("cn", "abcdefghij");
        let writer = Writer::new(LdifOptions { fold_width: 8, line_ending: LineEnding::CrLf });
        let text = writer.render_snapshot(&snapshot(vec![("o=x", attrs)]));

        assert_eq!(text, "dn: o=x\r\ncn: abcd\r\n efghij\r\n\r\n");
    }
}

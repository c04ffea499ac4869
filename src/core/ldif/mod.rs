//! LDIF codec: render snapshots as editable text and parse edited text back.
//!
//! Values are written as plain text unless they are not UTF-8 or contain a
//! line break, in which case they are base64-encoded behind `::`. Long lines
//! are folded by display width.

pub mod fold;
pub mod parser;
pub mod width;
pub mod writer;

pub use parser::{DuplicateDn, ParseOptions, Parser};
pub use writer::{LdifOptions, LineEnding, Writer, needs_base64};

/// Parse failure with the physical line it was detected on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed LDIF at line {line}: {kind}")]
pub struct MalformedLdif
{
    pub line: usize,
    pub kind: MalformedKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedKind
{
    #[error("continuation line has nothing to continue")]
    OrphanContinuation,
    #[error("entry does not start with a dn: line")]
    MissingDn,
    #[error("dn: line inside an entry (missing blank line?)")]
    UnexpectedDn,
    #[error("expected `attribute: value`, found {0:?}")]
    InvalidLine(String),
    #[error("invalid base64 value: {0}")]
    InvalidBase64(String),
    #[error("dn is not valid UTF-8")]
    DnNotUtf8,
    #[error("URL-referenced values are not supported")]
    UrlValue,
    #[error("change records are not supported")]
    ChangeRecord,
    #[error("duplicate entry {dn} (first declared at line {first})")]
    DuplicateDn
    {
        dn: String, first: usize
    },
}

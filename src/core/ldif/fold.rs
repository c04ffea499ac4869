//! Width-aware line folding and unfolding.
//!
//! A folded line is a leading segment followed by continuation lines that
//! start with exactly one space. Breaks only happen on codepoint boundaries and
//! zero-width characters stay attached to the character before them.

use crate::core::ldif::{
    MalformedKind, MalformedLdif,
    width::{char_width, str_width},
};

/// Split `line` into physical lines no wider than `width` columns, counting
/// the leading space of continuation lines. Every physical line carries at
/// least one codepoint, so a character wider than the limit still makes
/// progress. `width == 0` disables folding.
pub fn fold(
    line: &str,
    width: usize,
) -> Vec<String>
{
    if width == 0 || str_width(line) <= width
    {
        return vec![line.to_string()];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    let mut used = 0usize;
    let mut budget = width;

    for c in line.chars()
    {
        let w = char_width(c);
        if w > 0 && !current.is_empty() && used + w > budget
        {
            out.push(std::mem::take(&mut current));
            // Continuation lines give one column to the leading space.
            budget = width
                .saturating_sub(1)
                .max(1);
            used = 0;
        }
        current.push(c);
        used += w;
    }
    out.push(current);

    out.into_iter()
        .enumerate()
        .map(|(i, seg)| if i == 0 { seg } else { format!(" {seg}") })
        .collect()
}

/// One logical line after unfolding; `line` is the 1-based physical line it
/// started on. Blank lines come through as empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine
{
    pub line: usize,
    pub text: String,
}

/// Join continuation lines back onto the line they continue.
///
/// Physical lines may end with `\n` or `\r\n`. A continuation line with nothing
/// to continue (first line, or right after a blank line) is malformed.
pub fn unfold(text: &str) -> Result<Vec<LogicalLine>, MalformedLdif>
{
    let mut out: Vec<LogicalLine> = Vec::new();
    let mut open = false;

    for (idx, raw) in text
        .split('\n')
        .enumerate()
    {
        let line_no = idx + 1;
        let physical = raw
            .strip_suffix('\r')
            .unwrap_or(raw);

        if let Some(rest) = physical.strip_prefix(' ')
        {
            match out.last_mut()
            {
                Some(last) if open => last
                    .text
                    .push_str(rest),
                _ =>
                {
                    return Err(MalformedLdif { line: line_no, kind: MalformedKind::OrphanContinuation });
                }
            }
            continue;
        }

        open = !physical.is_empty();
        out.push(LogicalLine { line: line_no, text: physical.to_string() });
    }

    // A trailing newline leaves one empty physical line behind; drop it.
    if text.ends_with('\n')
        && out
            .last()
            .is_some_and(|l| l.text.is_empty())
    {
        out.pop();
    }

    Ok(out)
}

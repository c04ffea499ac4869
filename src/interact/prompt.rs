//! Operator prompts: the add/modify/delete confirmation and the "press Enter"
//! pause used when no editor could be launched.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Stderr, StderrLock, StdinLock, Write},
};

use crate::core::diff::ChangeSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation
{
    Proceed,
    KeepDraft,
    DiscardDraft,
}

impl Confirmation
{
    /// `y`, `n` or `q` (or the full words), any case; empty means yes.
    pub fn from_reply(reply: &str) -> Option<Confirmation>
    {
        match reply
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "" | "y" | "yes" => Some(Confirmation::Proceed),
            "n" | "no" => Some(Confirmation::KeepDraft),
            "q" | "quit" => Some(Confirmation::DiscardDraft),
            _ => None,
        }
    }
}

pub trait Prompter
{
    fn confirm(
        &mut self,
        summary: ChangeSummary,
    ) -> io::Result<Confirmation>;

    /// Show `message` and block until the operator presses Enter.
    fn pause(
        &mut self,
        message: &str,
    ) -> io::Result<()>;
}

/// Line-based prompts over any reader/writer pair.
pub struct TerminalPrompter<R, W>
{
    input: R,
    output: W,
    assume_yes: bool,
}

impl TerminalPrompter<StdinLock<'static>, StderrLock<'static>>
{
    pub fn stdio() -> Self
    {
        Self::new(
            io::stdin().lock(),
            io::stderr().lock(),
        )
    }
}

impl TerminalPrompter<BufReader<File>, Stderr>
{
    /// Read replies from the controlling terminal, for when stdin carries data.
    pub fn controlling_terminal() -> io::Result<Self>
    {
        #[cfg(windows)]
        const TERMINAL: &str = "CONIN$";
        #[cfg(not(windows))]
        const TERMINAL: &str = "/dev/tty";

        let tty = File::open(TERMINAL)?;
        Ok(Self::new(BufReader::new(tty), io::stderr()))
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W>
{
    pub fn new(
        input: R,
        output: W,
    ) -> Self
    {
        Self { input, output, assume_yes: false }
    }

    /// Answer every confirmation with "proceed" without asking.
    pub fn assume_yes(
        mut self,
        yes: bool,
    ) -> Self
    {
        self.assume_yes = yes;
        self
    }

    pub fn into_output(self) -> W
    {
        self.output
    }

    /// `None` on end of input.
    fn read_reply(&mut self) -> io::Result<Option<String>>
    {
        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)?;
        Ok((n > 0).then_some(line))
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W>
{
    fn confirm(
        &mut self,
        summary: ChangeSummary,
    ) -> io::Result<Confirmation>
    {
        if self.assume_yes
        {
            return Ok(Confirmation::Proceed);
        }

        loop
        {
            write!(self.output, "{summary}. Confirm? [Y/n/q] ")?;
            self.output
                .flush()?;

            let Some(reply) = self.read_reply()?
            else
            {
                // Closed input: nothing was decided, keep the operator's work.
                writeln!(self.output)?;
                return Ok(Confirmation::KeepDraft);
            };

            match Confirmation::from_reply(&reply)
            {
                Some(answer) => return Ok(answer),
                None => writeln!(self.output, "Please answer y, n or q.")?,
            }
        }
    }

    fn pause(
        &mut self,
        message: &str,
    ) -> io::Result<()>
    {
        writeln!(self.output, "{message}")?;
        self.output
            .flush()?;
        self.read_reply()
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests
{
    use std::io::Cursor;

    use super::*;

    fn summary() -> ChangeSummary
    {
        ChangeSummary { additions: 1, modifications: 2, deletions: 0 }
    }

    fn ask(input: &str) -> (Confirmation, String)
    {
        let mut prompter = TerminalPrompter::new(Cursor::new(input.to_string()), Vec::new());
        let answer = prompter
            .confirm(summary())
            .unwrap();
        (answer, String::from_utf8(prompter.into_output()).unwrap())
    }

    #[test]
    fn empty_reply_proceeds()
    {
        let (answer, shown) = ask("\n");
        assert_eq!(answer, Confirmation::Proceed);
        assert_eq!(shown, "add 1, modify 2, delete 0. Confirm? [Y/n/q] ");
    }

    #[test]
    fn n_keeps_and_q_discards()
    {
        assert_eq!(ask("n\n").0, Confirmation::KeepDraft);
        assert_eq!(ask("Q\n").0, Confirmation::DiscardDraft);
    }

    #[test]
    fn invalid_reply_asks_again()
    {
        let (answer, shown) = ask("maybe\ny\n");
        assert_eq!(answer, Confirmation::Proceed);
        assert_eq!(shown.matches("Confirm?").count(), 2);
        assert!(shown.contains("Please answer y, n or q."));
    }

    #[test]
    fn end_of_input_keeps_draft()
    {
        assert_eq!(ask("").0, Confirmation::KeepDraft);
    }

    #[test]
    fn assume_yes_never_reads()
    {
        let mut prompter = TerminalPrompter::new(Cursor::new(String::new()), Vec::new()).assume_yes(true);
        assert_eq!(prompter.confirm(summary()).unwrap(), Confirmation::Proceed);
        assert!(
            prompter
                .into_output()
                .is_empty()
        );
    }

    #[test]
    fn pause_prints_and_waits_for_a_line()
    {
        let mut prompter = TerminalPrompter::new(Cursor::new("\n".to_string()), Vec::new());
        prompter
            .pause("Now modify /tmp/x.ldif, and press Enter when you are done")
            .unwrap();
        assert_eq!(
            String::from_utf8(prompter.into_output()).unwrap(),
            "Now modify /tmp/x.ldif, and press Enter when you are done\n"
        );
    }
}

//! Line-oriented terminal: command input, output, notices and confirmations.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::Mutex;

use crate::application::prompt::Prompt;

type Input = Box<dyn BufRead + Send>;
type Output = Box<dyn Write + Send>;

/// Shared handle over the operator's terminal.
///
/// Commands and confirmation answers come from the same input, so the
/// interactive loop and the console's [`Prompt`] calls never compete for it.
pub struct Terminal {
    input: Mutex<Input>,
    output: Mutex<Output>,
    notices: Mutex<Output>,
    assume_yes: bool,
}

impl Terminal {
    pub fn new(input: Input, output: Output, notices: Output) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            notices: Mutex::new(notices),
            assume_yes: false,
        }
    }

    /// Standard streams; notices and questions go to stderr.
    pub fn stdio() -> Self {
        Self::new(
            Box::new(BufReader::new(io::stdin())),
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        )
    }

    /// Answer every confirmation with yes without reading input.
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    /// Next input line without its terminator; `None` at end of input.
    pub fn read_line(&self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = match self.input.lock() {
            Ok(mut input) => input.read_line(&mut line)?,
            Err(_) => return Err(io::Error::other("terminal input lock poisoned")),
        };
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub fn print(&self, text: &str) -> io::Result<()> {
        write_line(&self.output, text)
    }

    pub fn notice(&self, text: &str) -> io::Result<()> {
        write_line(&self.notices, text)
    }
}

fn write_line(target: &Mutex<Output>, text: &str) -> io::Result<()> {
    let mut out = target
        .lock()
        .map_err(|_| io::Error::other("terminal output lock poisoned"))?;
    writeln!(out, "{text}")?;
    out.flush()
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

impl Prompt for Terminal {
    fn alert(&self, message: &str) {
        if let Err(err) = self.notice(&format!("! {message}")) {
            tracing::warn!(error = %err, message, "failed to show notice");
        }
    }

    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        if self.notice(&format!("? {message} [y/N]")).is_err() {
            return false;
        }
        match self.read_line() {
            Ok(Some(answer)) => is_yes(&answer),
            _ => false,
        }
    }
}

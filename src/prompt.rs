//! Interactive yes/no/always confirmation protocol
//!
//! A blocking prompt primitive with an optional timeout that falls back
//! to the caller-supplied default. The timeout is modelled as a race
//! between the console read and a timer rather than a signal, so it
//! works on every platform.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Outcome of a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// "Yes, and stop asking" — only returned when the caller offered it.
    Always,
}

impl Answer {
    pub fn accepted(self) -> bool {
        matches!(self, Answer::Yes | Answer::Always)
    }
}

/// The answer assumed on empty input or timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultAnswer {
    Yes,
    No,
}

impl From<DefaultAnswer> for Answer {
    fn from(default: DefaultAnswer) -> Self {
        match default {
            DefaultAnswer::Yes => Answer::Yes,
            DefaultAnswer::No => Answer::No,
        }
    }
}

/// A console channel that can display a question and wait for one line.
///
/// `Ok(None)` means the wait timed out.
pub trait Console {
    fn ask(&mut self, question: &str, timeout: Option<Duration>) -> io::Result<Option<String>>;
}

/// Console backed by stdin/stderr.
///
/// A detached reader thread feeds lines into a channel; `ask` races the
/// channel against the timeout. A timed-out read leaves the thread
/// parked on stdin until the next line arrives, so pending lines are
/// drained before each new question.
pub struct StdinConsole {
    lines: Receiver<io::Result<String>>,
}

impl StdinConsole {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self { lines: rx }
    }
}

impl Default for StdinConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for StdinConsole {
    fn ask(&mut self, question: &str, timeout: Option<Duration>) -> io::Result<Option<String>> {
        // Drop anything typed before the question was shown
        while self.lines.try_recv().is_ok() {}

        let mut stderr = io::stderr();
        write!(stderr, "{question} ")?;
        stderr.flush()?;

        let line = match timeout {
            None => self.lines.recv(),
            Some(limit) => match self.lines.recv_timeout(limit) {
                Ok(line) => Ok(line),
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => Err(mpsc::RecvError),
            },
        };
        match line {
            Ok(line) => line.map(Some),
            // Reader thread gone: stdin reached EOF
            Err(_) => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed")),
        }
    }
}

/// Console double that replays a fixed list of responses.
///
/// Records every question it was asked; panics when the script runs dry,
/// which keeps the intentional re-prompt loop in [`confirm`] finite in
/// tests.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    responses: Vec<String>,
    pub questions: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut responses: Vec<String> = responses.into_iter().map(Into::into).collect();
        responses.reverse();
        Self {
            responses,
            questions: Vec::new(),
        }
    }

    /// How many prompts were shown.
    pub fn asked(&self) -> usize {
        self.questions.len()
    }
}

impl Console for ScriptedConsole {
    fn ask(&mut self, question: &str, _timeout: Option<Duration>) -> io::Result<Option<String>> {
        self.questions.push(question.to_string());
        match self.responses.pop() {
            Some(line) => Ok(Some(line)),
            None => panic!("ScriptedConsole ran out of responses for: {question}"),
        }
    }
}

/// Ask a yes/no (or yes/no/always) question and block until answered.
///
/// Empty input and timeouts resolve to `default`; the first character of
/// the reply decides (`y`/`n`/`a`, case-insensitive); anything else
/// re-prompts. `always` is only offered and only returned when
/// `offer_always` is set.
pub fn confirm(
    console: &mut dyn Console,
    question: &str,
    default: DefaultAnswer,
    timeout: Option<Duration>,
    offer_always: bool,
) -> Answer {
    // Capitalize the default option, the way shells render prompts
    let (yes, no) = match default {
        DefaultAnswer::Yes => ("Yes", "no"),
        DefaultAnswer::No => ("yes", "No"),
    };
    let options = if offer_always {
        format!("[{yes}/{no}/always]")
    } else {
        format!("[{yes}/{no}]")
    };
    let timeout_note = match timeout {
        Some(limit) => format!(" (timeout in {}s)", limit.as_secs()),
        None => String::new(),
    };
    let prompt = format!("{question}{timeout_note} {options}:");

    loop {
        let reply = match console.ask(&prompt, timeout) {
            Ok(Some(line)) => line.trim().to_lowercase(),
            Ok(None) => {
                tracing::warn!(?default, "Prompt timed out, using default answer");
                String::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, ?default, "Console read failed, using default answer");
                String::new()
            }
        };
        match reply.chars().next() {
            None => return default.into(),
            Some('y') => return Answer::Yes,
            Some('n') => return Answer::No,
            Some('a') if offer_always => return Answer::Always,
            _ => continue, // invalid input, ask again
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_character_decides() {
        let mut console = ScriptedConsole::new(["yep"]);
        assert_eq!(
            confirm(&mut console, "Q?", DefaultAnswer::No, None, false),
            Answer::Yes
        );
        let mut console = ScriptedConsole::new(["Nope"]);
        assert_eq!(
            confirm(&mut console, "Q?", DefaultAnswer::Yes, None, false),
            Answer::No
        );
    }

    #[test]
    fn test_empty_input_returns_default() {
        let mut console = ScriptedConsole::new([""]);
        assert_eq!(
            confirm(&mut console, "Q?", DefaultAnswer::Yes, None, false),
            Answer::Yes
        );
        let mut console = ScriptedConsole::new(["   "]);
        assert_eq!(
            confirm(&mut console, "Q?", DefaultAnswer::No, None, false),
            Answer::No
        );
    }

    #[test]
    fn test_invalid_input_reprompts() {
        let mut console = ScriptedConsole::new(["maybe", "?", "y"]);
        assert_eq!(
            confirm(&mut console, "Q?", DefaultAnswer::No, None, false),
            Answer::Yes
        );
        assert_eq!(console.asked(), 3);
    }

    #[test]
    fn test_always_only_when_offered() {
        let mut console = ScriptedConsole::new(["always"]);
        assert_eq!(
            confirm(&mut console, "Q?", DefaultAnswer::Yes, None, true),
            Answer::Always
        );
        // Without the offer, "a..." is invalid input and re-prompts
        let mut console = ScriptedConsole::new(["always", "n"]);
        assert_eq!(
            confirm(&mut console, "Q?", DefaultAnswer::Yes, None, false),
            Answer::No
        );
        assert_eq!(console.asked(), 2);
    }

    #[test]
    fn test_options_rendered_in_question() {
        let mut console = ScriptedConsole::new(["y"]);
        confirm(&mut console, "Overwrite?", DefaultAnswer::Yes, None, true);
        assert!(console.questions[0].contains("[Yes/no/always]"));

        let mut console = ScriptedConsole::new(["y"]);
        confirm(
            &mut console,
            "Overwrite?",
            DefaultAnswer::No,
            Some(Duration::from_secs(30)),
            false,
        );
        assert!(console.questions[0].contains("[yes/No]"));
        assert!(console.questions[0].contains("timeout in 30s"));
    }

    /// Console that always reports a timeout.
    struct DeafConsole;

    impl Console for DeafConsole {
        fn ask(&mut self, _q: &str, _t: Option<Duration>) -> io::Result<Option<String>> {
            Ok(None)
        }
    }

    #[test]
    fn test_timeout_falls_back_to_default() {
        let mut console = DeafConsole;
        assert_eq!(
            confirm(
                &mut console,
                "Q?",
                DefaultAnswer::No,
                Some(Duration::from_millis(1)),
                false
            ),
            Answer::No
        );
    }
}

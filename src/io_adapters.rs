//! Line sources a session reads its commands from.

use crate::completion::{CompletionResolver, ShellHelper};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::rc::Rc;

/// Outcome of one read from a [`LineSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// A line of input, without its line terminator.
    Line(String),
    /// The user pressed the interrupt key while the prompt was showing.
    Interrupted,
    /// No more input.
    Eof,
}

/// Where a session gets its lines from.
pub trait LineSource {
    /// Read the next line, showing `prompt` if the source talks to a terminal.
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadEvent>;

    /// Interactive sources display the prompt themselves, so the session does
    /// not echo what was typed.
    fn is_interactive(&self) -> bool {
        false
    }

    fn add_history(&mut self, _line: &str) {}

    /// Called before every read with the resolver of the reading session.
    fn install_completer(&mut self, _resolver: Rc<CompletionResolver>) {}
}

/// Reads lines from any buffered reader, such as a script file or a pipe.
pub struct StreamSource<R> {
    reader: R,
}

impl<R: BufRead> StreamSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> LineSource for StreamSource<R> {
    fn read_line(&mut self, _prompt: &str) -> io::Result<ReadEvent> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(ReadEvent::Eof);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(ReadEvent::Line(line))
    }
}

/// One queued step of a [`ScriptedSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    Line(String),
    /// Behave as if the user pressed the interrupt key at the prompt.
    Interrupt,
    /// Fail the read with an I/O error carrying this message.
    Fault(String),
}

impl From<&str> for Scripted {
    fn from(line: &str) -> Self {
        Scripted::Line(line.to_string())
    }
}

impl From<String> for Scripted {
    fn from(line: String) -> Self {
        Scripted::Line(line)
    }
}

/// In-memory source replaying a fixed script, then reporting end of input.
///
/// Mostly useful for driving sessions from code and tests.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    steps: VecDeque<Scripted>,
    reads: usize,
    interactive: bool,
    history: Vec<String>,
}

impl ScriptedSource {
    pub fn new<I, T>(steps: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scripted>,
    {
        Self {
            steps: steps.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Pretend to be a terminal, which turns off input echo.
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn push(&mut self, step: impl Into<Scripted>) {
        self.steps.push_back(step.into());
    }

    /// Number of reads performed so far, including the one that hit the end.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Steps that were never read.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl LineSource for ScriptedSource {
    fn read_line(&mut self, _prompt: &str) -> io::Result<ReadEvent> {
        self.reads += 1;
        match self.steps.pop_front() {
            Some(Scripted::Line(line)) => Ok(ReadEvent::Line(line)),
            Some(Scripted::Interrupt) => Ok(ReadEvent::Interrupted),
            Some(Scripted::Fault(message)) => Err(io::Error::other(message)),
            None => Ok(ReadEvent::Eof),
        }
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }
}

/// Terminal input through a rustyline editor, with tab completion and
/// in-memory history.
pub struct InteractiveSource {
    editor: Editor<ShellHelper, DefaultHistory>,
}

impl InteractiveSource {
    pub fn new() -> rustyline::Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(ShellHelper::default()));
        Ok(Self { editor })
    }
}

impl LineSource for InteractiveSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadEvent::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadEvent::Eof),
            Err(ReadlineError::Io(err)) => Err(err),
            Err(err) => Err(io::Error::other(err.to_string())),
        }
    }

    fn is_interactive(&self) -> bool {
        true
    }

    fn add_history(&mut self, line: &str) {
        if let Err(err) = self.editor.add_history_entry(line) {
            log::warn!("Failed to record history entry: {err}");
        }
    }

    fn install_completer(&mut self, resolver: Rc<CompletionResolver>) {
        self.editor.set_helper(Some(ShellHelper::new(resolver)));
    }
}

//! The read/eval loop of a [`Session`] and the done flags linking nested sessions.

use crate::builtin;
use crate::command::{Context, Shell};
use crate::completion::CompletionResolver;
use crate::config::{EofPolicy, SessionConfig};
use crate::dispatch::{dispatch, is_interrupt};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::{ExternalRunner, SystemShell};
use crate::io_adapters::{InteractiveSource, LineSource, ReadEvent, StreamSource};
use crate::lexer::{self, LexingError};
use crate::registry::Registry;
use crate::signal::{self, InterruptFlag};
use std::cell::{Cell, RefCell};
use std::io::{self, BufRead, Write};
use std::rc::{Rc, Weak};

/// Done flag of a running session, linked to the session it is nested in.
pub(crate) struct Control {
    done: Cell<bool>,
    parent: RefCell<Option<Weak<Control>>>,
}

impl Control {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            done: Cell::new(false),
            parent: RefCell::new(None),
        })
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done.get()
    }

    pub(crate) fn close(&self) {
        self.done.set(true);
    }

    /// Mark this session and every live ancestor as done.
    pub(crate) fn exit(&self) {
        self.done.set(true);
        let mut next = self.parent.borrow().as_ref().and_then(Weak::upgrade);
        while let Some(control) = next {
            control.done.set(true);
            next = control.parent.borrow().as_ref().and_then(Weak::upgrade);
        }
    }

    fn reset(&self, parent: Option<&Rc<Control>>) {
        self.done.set(false);
        *self.parent.borrow_mut() = parent.map(Rc::downgrade);
    }
}

/// What a nested session inherits from the session that started it.
pub(crate) struct Link<'a> {
    pub(crate) control: &'a Rc<Control>,
    pub(crate) interrupt: &'a InterruptFlag,
}

/// A command loop over a shell of type `S`.
///
/// The session reads lines from a [`LineSource`], runs them against the
/// shell's command table and writes everything it reports to the output it
/// was started with.
///
/// Example
/// ```
/// use cmdloop::{Arity, Registry, ScriptedSource, Session, Shell};
///
/// struct Counter(u32);
///
/// impl Shell for Counter {
///     fn commands(registry: &mut Registry<Self>) {
///         registry.command("inc", Arity::NONE, |counter, _ctx, _params| {
///             counter.0 += 1;
///             Ok(())
///         });
///     }
/// }
///
/// let mut session = Session::new(Counter(0));
/// let mut input = ScriptedSource::new(["inc", "inc", "exit"]);
/// session.run(&mut input, &mut Vec::new());
/// assert_eq!(session.shell().0, 2);
/// ```
pub struct Session<S> {
    shell: S,
    registry: Registry<S>,
    config: SessionConfig,
    control: Rc<Control>,
    resolver: Rc<CompletionResolver>,
    env: Environment,
    runner: Box<dyn ExternalRunner>,
    interrupt: InterruptFlag,
}

impl<S: Shell> Session<S> {
    /// Session with the built-in commands, the shell's commands and the
    /// shell's own [`Shell::config`].
    pub fn new(shell: S) -> Self {
        let config = shell.config();
        Self::with_config(shell, config)
    }

    pub fn with_config(shell: S, config: SessionConfig) -> Self {
        let mut registry = Registry::with_builtins();
        S::commands(&mut registry);
        Self::from_parts(shell, registry, config)
    }
}

impl<S: 'static> Session<S> {
    /// Session over a command table built by hand.
    pub fn from_parts(shell: S, mut registry: Registry<S>, config: SessionConfig) -> Self {
        builtin::attach_help_completion(&mut registry);
        let resolver = Rc::new(CompletionResolver::new(&registry));
        Self {
            shell,
            registry,
            config,
            control: Control::new(),
            resolver,
            env: Environment::new(),
            runner: Box::new(SystemShell),
            interrupt: InterruptFlag::default(),
        }
    }

    /// Replace what runs escaped lines.
    pub fn with_runner(mut self, runner: impl ExternalRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut S {
        &mut self.shell
    }

    pub fn into_shell(self) -> S {
        self.shell
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Completion for this session's commands.
    pub fn completer(&self) -> Rc<CompletionResolver> {
        Rc::clone(&self.resolver)
    }

    pub fn is_done(&self) -> bool {
        self.control.is_done()
    }

    /// Raising this flag interrupts the command currently running.
    pub fn interrupt_flag(&self) -> &InterruptFlag {
        &self.interrupt
    }

    /// Let Ctrl-C interrupt running commands instead of the process.
    ///
    /// Called by [`Session::run_stream`] and [`Session::run_interactive`].
    /// When the handler cannot be installed the default SIGINT behaviour
    /// stays in place.
    pub fn catch_interrupts(&mut self) {
        if self.interrupt.is_process_flag() {
            return;
        }
        match signal::install() {
            Ok(flag) => self.interrupt = InterruptFlag::from_shared(flag),
            Err(err) => log::warn!("Cannot catch Ctrl-C, it will stop the program: {err}"),
        }
    }

    /// Run the command loop until the session is done.
    ///
    /// # Arguments
    /// * `input` - Where lines are read from.
    /// * `out` - Where command output, echoed input and error reports go.
    pub fn run(&mut self, input: &mut dyn LineSource, out: &mut dyn Write) {
        self.run_linked(None, input, out);
    }

    /// Run over a script or pipe.
    pub fn run_stream<R: BufRead>(&mut self, reader: R, out: &mut dyn Write) {
        self.catch_interrupts();
        let mut source = StreamSource::new(reader);
        self.run(&mut source, out);
    }

    /// Run on the terminal with line editing, history and tab completion.
    pub fn run_interactive(&mut self) -> rustyline::Result<()> {
        self.catch_interrupts();
        let mut source = InteractiveSource::new()?;
        let mut out = io::stdout();
        self.run(&mut source, &mut out);
        Ok(())
    }

    pub(crate) fn run_linked(
        &mut self,
        parent: Option<Link<'_>>,
        input: &mut dyn LineSource,
        out: &mut dyn Write,
    ) {
        if let Some(link) = &parent {
            self.interrupt = link.interrupt.clone();
        }
        self.control.reset(parent.map(|link| link.control));
        log::debug!("Starting session ({})", self.config.prompt);
        if let Some(banner) = &self.config.banner {
            report(out, banner);
        }

        while !self.control.is_done() {
            if let Some(line) = self.next_line(input, out) {
                self.process_line(&line, input, out);
            }
        }
        log::debug!("Session finished ({})", self.config.prompt);
    }

    /// Tokenize and dispatch one line, without shell escapes or variable
    /// expansion.
    ///
    /// Blank lines succeed without running anything.
    pub fn execute_line(
        &mut self,
        line: &str,
        input: &mut dyn LineSource,
        out: &mut dyn Write,
    ) -> Result<(), ShellError> {
        let parsed = match lexer::tokenize(line) {
            Ok(parsed) => parsed,
            Err(LexingError::Empty) => return Ok(()),
            Err(LexingError::Syntax(err)) => return Err(err.into()),
        };
        let mut ctx = Context {
            out,
            input,
            control: &self.control,
            registry: &self.registry,
            config: &self.config,
            env: &mut self.env,
            interrupt: &self.interrupt,
        };
        dispatch(&mut self.shell, &mut ctx, &parsed)
    }

    fn next_line(&self, input: &mut dyn LineSource, out: &mut dyn Write) -> Option<String> {
        input.install_completer(Rc::clone(&self.resolver));
        if self.interrupt.take() {
            log::debug!("Dropping Ctrl-C received between commands");
        }
        match input.read_line(&self.config.prompt) {
            Ok(ReadEvent::Line(line)) => {
                if self.config.echo_input && !input.is_interactive() {
                    report(out, &format!("{}{}", self.config.prompt, line));
                }
                if !line.trim().is_empty() {
                    input.add_history(&line);
                }
                Some(line)
            }
            Ok(ReadEvent::Interrupted) => {
                log::debug!("Interrupted while waiting for input");
                self.control.close();
                None
            }
            Ok(ReadEvent::Eof) => {
                log::debug!("End of input");
                match self.config.eof {
                    EofPolicy::Close => self.control.close(),
                    EofPolicy::Exit => self.control.exit(),
                }
                None
            }
            Err(err) => {
                log::error!("Failed to read input: {err:?}");
                report(out, &format!("Unexpected error during input sequence: {err}"));
                self.control.close();
                None
            }
        }
    }

    fn process_line(&mut self, line: &str, input: &mut dyn LineSource, out: &mut dyn Write) {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            return;
        }
        if let Some(escape) = self.config.escape {
            if let Some(command) = trimmed.strip_prefix(escape) {
                self.run_external(command.trim(), out);
                return;
            }
        }

        let expanded = if self.config.expand_variables {
            self.env.expand(line)
        } else {
            line.into()
        };
        if let Err(err) = self.execute_line(&expanded, input, out) {
            report_error(&err, out);
        }
    }

    fn run_external(&mut self, command: &str, out: &mut dyn Write) {
        if command.is_empty() {
            log::debug!("Ignoring empty shell escape");
            return;
        }
        let result = self.runner.run(command, &self.env, out);
        let interrupted = self.interrupt.take();
        match result {
            _ if interrupted => {
                log::debug!("{command} interrupted by user");
                report(out, "");
            }
            Err(err) if is_interrupt(&err) => {
                log::debug!("{command} interrupted by user: {err:?}");
                report(out, "");
            }
            Ok(0) => {}
            Ok(code) => {
                report(out, &format!("Failed to run command {command}: exit status {code}"));
            }
            Err(err) => {
                log::debug!("{err:?}");
                report(out, &format!("Failed to run command {command}: {err}"));
            }
        }
    }
}

fn report_error(err: &ShellError, out: &mut dyn Write) {
    match err {
        ShellError::Interrupted { command } => {
            log::debug!("{command} interrupted by user");
            report(out, "");
        }
        ShellError::InvalidSyntax(syntax) => {
            log::debug!("{syntax}");
            report(out, "Parsing error:");
            report(out, &format!("\t{}", syntax.line));
            report(out, &format!("\t{}", syntax.caret()));
        }
        ShellError::HandlerFailure { command, source } => {
            log::debug!("Unknown error detected in {command}: {source:?}");
            report(out, &err.to_string());
        }
        ShellError::CommandNotFound { .. } | ShellError::ArityMismatch { .. } => {
            report(out, &err.to_string());
        }
    }
}

fn report(out: &mut dyn Write, message: &str) {
    if let Err(err) = writeln!(out, "{message}") {
        log::warn!("Failed to write to session output: {err}");
    }
}

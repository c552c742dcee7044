//! The [`Shell`] trait, command descriptors and the [`Context`] handlers run in.

use crate::config::SessionConfig;
use crate::env::Environment;
use crate::error::{Interrupted, ShellError};
use crate::interpreter::{Control, Link, Session};
use crate::io_adapters::LineSource;
use crate::registry::Registry;
use crate::signal::InterruptFlag;
use anyhow::Result;
use std::io::Write;
use std::rc::Rc;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Signature of a command handler for a shell of type `S`.
pub type HandlerFn<S> = dyn Fn(&mut S, &mut Context<'_, S>, &[String]) -> Result<()>;

/// Signature of a parameter completion function: `(params, param_index)`.
pub type CompleterFn = dyn Fn(&[String], usize) -> Result<Vec<String>>;

/// Signature of an extended help provider.
pub type HelpFn = dyn Fn() -> String;

/// A shell type: some state plus the table of commands operating on it.
///
/// The table is built once, when a [`Session`] is created for the shell.
pub trait Shell: Sized + 'static {
    /// Register this shell's commands.
    fn commands(registry: &mut Registry<Self>);

    /// Settings used by [`Session::new`].
    fn config(&self) -> SessionConfig {
        SessionConfig::default()
    }
}

/// How many parameters a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    required: usize,
    max: Option<usize>,
}

impl Arity {
    /// No parameters at all.
    pub const NONE: Arity = Arity::exact(0);

    /// Exactly `count` parameters.
    pub const fn exact(count: usize) -> Self {
        Self {
            required: count,
            max: Some(count),
        }
    }

    /// `required` mandatory parameters followed by optional ones, up to `max` in total.
    pub const fn range(required: usize, max: usize) -> Self {
        let max = if max < required { required } else { max };
        Self {
            required,
            max: Some(max),
        }
    }

    /// `required` mandatory parameters followed by any number of extra ones.
    ///
    /// Every extra token is passed to the handler as its own parameter.
    pub const fn at_least(required: usize) -> Self {
        Self {
            required,
            max: None,
        }
    }

    /// Number of mandatory parameters.
    pub fn required(&self) -> usize {
        self.required
    }

    /// Upper bound, `None` when unbounded.
    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub fn is_variadic(&self) -> bool {
        self.max.is_none()
    }

    /// `true` if a call with `provided` parameters is within bounds.
    pub fn accepts(&self, provided: usize) -> bool {
        self.required <= provided && self.max.is_none_or(|max| provided <= max)
    }

    /// Fails with [`ShellError::ArityMismatch`] when `provided` is out of range.
    pub fn check(&self, command: &str, provided: usize) -> Result<(), ShellError> {
        if self.accepts(provided) {
            return Ok(());
        }
        Err(ShellError::ArityMismatch {
            command: command.to_string(),
            required: self.required,
            max: self.max,
            provided,
        })
    }
}

/// Descriptor of one registered command.
///
/// Returned by [`Registry::command`] so optional capabilities can be chained:
///
/// ```
/// use cmdloop::{Arity, Registry};
///
/// let mut registry: Registry<Vec<String>> = Registry::new();
/// registry
///     .command("add", Arity::exact(1), |items, _ctx, params| {
///         items.push(params[0].clone());
///         Ok(())
///     })
///     .alias("a")
///     .describe("Add an item to the list");
/// assert!(registry.find("a").is_some());
/// ```
pub struct CommandSpec<S> {
    name: String,
    aliases: Vec<String>,
    arity: Arity,
    description: Option<String>,
    help: Option<Box<HelpFn>>,
    completer: Option<Rc<CompleterFn>>,
    handler: Box<HandlerFn<S>>,
}

impl<S> CommandSpec<S> {
    pub(crate) fn new<F>(name: String, arity: Arity, handler: F) -> Self
    where
        F: Fn(&mut S, &mut Context<'_, S>, &[String]) -> Result<()> + 'static,
    {
        Self {
            name,
            aliases: Vec::new(),
            arity,
            description: None,
            help: None,
            completer: None,
            handler: Box::new(handler),
        }
    }

    /// Another name the command answers to.
    pub fn alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.aliases.push(alias.into());
        self
    }

    /// Documentation; the first line is shown in the command listing.
    pub fn describe(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Parameter completion for this command.
    pub fn completer<F>(&mut self, completer: F) -> &mut Self
    where
        F: Fn(&[String], usize) -> Result<Vec<String>> + 'static,
    {
        self.completer = Some(Rc::new(completer));
        self
    }

    /// Extended help shown by `help <name>`.
    pub fn help<F>(&mut self, help: F) -> &mut Self
    where
        F: Fn() -> String + 'static,
    {
        self.help = Some(Box::new(help));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// First line of the description.
    pub fn summary(&self) -> Option<&str> {
        self.description.as_deref().and_then(|d| d.lines().next())
    }

    pub fn has_help(&self) -> bool {
        self.help.is_some()
    }

    pub fn help_text(&self) -> Option<String> {
        self.help.as_ref().map(|help| help())
    }

    pub fn has_completer(&self) -> bool {
        self.completer.is_some()
    }

    pub(crate) fn completer_fn(&self) -> Option<Rc<CompleterFn>> {
        self.completer.clone()
    }

    /// `true` if `name` is the command's name or one of its aliases.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| alias == name)
    }

    pub(crate) fn invoke(
        &self,
        shell: &mut S,
        ctx: &mut Context<'_, S>,
        params: &[String],
    ) -> Result<()> {
        (self.handler)(shell, ctx, params)
    }
}

/// What a running command can reach besides its own shell state.
pub struct Context<'a, S> {
    /// Output of the session the command runs in.
    pub out: &'a mut dyn Write,
    pub(crate) input: &'a mut dyn LineSource,
    pub(crate) control: &'a Rc<Control>,
    pub(crate) registry: &'a Registry<S>,
    pub(crate) config: &'a SessionConfig,
    pub(crate) env: &'a mut Environment,
    pub(crate) interrupt: &'a InterruptFlag,
}

impl<'a, S> Context<'a, S> {
    /// Finish this session and every session it is nested in.
    pub fn exit(&self) {
        self.control.exit();
    }

    /// Finish this session only; a parent session keeps running.
    pub fn close(&self) {
        self.control.close();
    }

    pub fn is_done(&self) -> bool {
        self.control.is_done()
    }

    pub fn prompt(&self) -> &str {
        &self.config.prompt
    }

    pub fn config(&self) -> &SessionConfig {
        self.config
    }

    /// The command table of the running session.
    pub fn commands(&self) -> &'a Registry<S> {
        self.registry
    }

    pub fn env(&self) -> &Environment {
        &*self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut *self.env
    }

    pub fn is_interactive(&self) -> bool {
        self.input.is_interactive()
    }

    /// `true` once Ctrl-C was pressed while this command runs.
    ///
    /// Long running handlers poll this and return early; the session reports
    /// the command as interrupted either way.
    pub fn interrupted(&self) -> bool {
        self.interrupt.is_raised()
    }

    /// Fails with [`Interrupted`] once Ctrl-C was pressed.
    pub fn check_interrupted(&self) -> Result<()> {
        if self.interrupted() {
            return Err(Interrupted.into());
        }
        Ok(())
    }

    /// The flag Ctrl-C raises while this session runs a command.
    pub fn interrupt_flag(&self) -> &InterruptFlag {
        self.interrupt
    }

    fn link(&self) -> Link<'a> {
        Link {
            control: self.control,
            interrupt: self.interrupt,
        }
    }

    /// Run `child` on this session's input and output until it finishes.
    ///
    /// `exit` inside the child also finishes this session; `close` returns
    /// here and this session carries on with the next line.
    pub fn run_nested<T: 'static>(&mut self, child: &mut Session<T>) {
        child.run_linked(Some(self.link()), &mut *self.input, &mut *self.out);
    }

    /// Like [`Context::run_nested`], reading the child's lines from `input`.
    pub fn run_nested_with<T: 'static>(
        &mut self,
        child: &mut Session<T>,
        input: &mut dyn LineSource,
    ) {
        child.run_linked(Some(self.link()), input, &mut *self.out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_arity() {
        let arity = Arity::exact(2);
        assert!(!arity.accepts(1));
        assert!(arity.accepts(2));
        assert!(!arity.accepts(3));
        assert!(!arity.is_variadic());
    }

    #[test]
    fn optional_parameters() {
        let arity = Arity::range(1, 3);
        assert_eq!(arity.required(), 1);
        assert_eq!(arity.max(), Some(3));
        assert!(!arity.accepts(0));
        assert!((1..=3).all(|n| arity.accepts(n)));
        assert!(!arity.accepts(4));
    }

    #[test]
    fn range_never_below_required() {
        assert_eq!(Arity::range(2, 1), Arity::exact(2));
    }

    #[test]
    fn variadic_accepts_any_excess() {
        let arity = Arity::at_least(1);
        assert!(!arity.accepts(0));
        assert!(arity.accepts(1));
        assert!(arity.accepts(1000));
        assert!(arity.is_variadic());
    }

    #[test]
    fn check_reports_counts() {
        match Arity::NONE.check("close", 1) {
            Err(ShellError::ArityMismatch {
                command,
                required,
                max,
                provided,
            }) => {
                assert_eq!(command, "close");
                assert_eq!(required, 0);
                assert_eq!(max, Some(0));
                assert_eq!(provided, 1);
            }
            other => panic!("expected arity mismatch, got {:?}", other),
        }
        assert!(Arity::NONE.check("close", 0).is_ok());
    }

    #[test]
    fn spec_capabilities() {
        let mut spec: CommandSpec<()> =
            CommandSpec::new("greet".into(), Arity::exact(1), |_, _, _| Ok(()));
        assert!(!spec.has_help());
        assert!(!spec.has_completer());
        assert_eq!(spec.summary(), None);

        spec.alias("hi")
            .describe("Say hello\nLonger explanation")
            .help(|| "greet <name>".to_string())
            .completer(|_, _| Ok(vec!["world".to_string()]));

        assert!(spec.answers_to("greet"));
        assert!(spec.answers_to("hi"));
        assert!(!spec.answers_to("Greet"));
        assert_eq!(spec.summary(), Some("Say hello"));
        assert_eq!(spec.help_text().as_deref(), Some("greet <name>"));
        assert!(spec.has_completer());
    }
}

//! Command registry - explicit command registration and lookup.

use crate::builtin;
use crate::command::{Arity, CommandSpec, Context};
use anyhow::Result;

/// Help-listing view of a registered command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    pub aliases: Vec<String>,
    /// First line of the command description, empty when undocumented.
    pub summary: String,
    /// Whether `help <name>` has extended help to show.
    pub has_help: bool,
}

/// The command table of a shell of type `S`, in registration order.
pub struct Registry<S> {
    specs: Vec<CommandSpec<S>>,
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self { specs: Vec::new() }
    }
}

impl<S> Registry<S> {
    /// An empty table, without the built-in commands.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the built-in `exit`, `close` and `help` commands.
    pub fn with_builtins() -> Self
    where
        S: 'static,
    {
        let mut registry = Self::new();
        builtin::register(&mut registry);
        registry
    }

    /// Register `handler` under `name`.
    ///
    /// A command already registered under the same name is replaced in place,
    /// keeping its position in the listing.
    pub fn command<F>(
        &mut self,
        name: impl Into<String>,
        arity: Arity,
        handler: F,
    ) -> &mut CommandSpec<S>
    where
        F: Fn(&mut S, &mut Context<'_, S>, &[String]) -> Result<()> + 'static,
    {
        let spec = CommandSpec::new(name.into(), arity, handler);
        let index = match self.specs.iter().position(|s| s.name() == spec.name()) {
            Some(index) => {
                log::debug!("Replacing command {}", spec.name());
                self.specs[index] = spec;
                index
            }
            None => {
                self.specs.push(spec);
                self.specs.len() - 1
            }
        };
        &mut self.specs[index]
    }

    /// Find a command by exact name or alias.
    ///
    /// Names take precedence over aliases.
    pub fn find(&self, name: &str) -> Option<&CommandSpec<S>> {
        self.specs
            .iter()
            .find(|spec| spec.name() == name)
            .or_else(|| self.specs.iter().find(|spec| spec.answers_to(name)))
    }

    pub(crate) fn find_mut(&mut self, name: &str) -> Option<&mut CommandSpec<S>> {
        self.specs.iter_mut().find(|spec| spec.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommandSpec<S>> {
        self.specs.iter()
    }

    /// Command names in registration order, aliases excluded.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|spec| spec.name())
    }

    /// Command names starting with `prefix`, in registration order.
    pub fn names_starting_with(&self, prefix: &str) -> Vec<String> {
        names_with_prefix(self.names(), prefix)
    }

    /// One [`CommandInfo`] per command, in registration order.
    pub fn describe(&self) -> Vec<CommandInfo> {
        self.specs
            .iter()
            .map(|spec| CommandInfo {
                name: spec.name().to_string(),
                aliases: spec.aliases().to_vec(),
                summary: spec.summary().unwrap_or_default().to_string(),
                has_help: spec.has_help(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

pub(crate) fn names_with_prefix<'a>(
    names: impl Iterator<Item = &'a str>,
    prefix: &str,
) -> Vec<String> {
    names
        .filter(|name| name.starts_with(prefix))
        .map(str::to_string)
        .collect()
}

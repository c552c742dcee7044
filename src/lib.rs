//! An embeddable, interactive command shell engine.
//!
//! A program describes a shell as some state plus a table of named commands
//! ([`Shell`]), and this crate runs the loop around it: reading lines with a
//! prompt, splitting them into a command word and quote-aware parameters,
//! checking parameter counts, invoking handlers and reporting failures without
//! ever stopping the loop. On top of that it provides online help, tab
//! completion, nested sub-shells and a `!` escape to the system shell.
//!
//! The main entry point is [`Session`]. Commands are registered explicitly in
//! [`Shell::commands`] through the [`Registry`] builder; a handler reaches the
//! running session through its [`Context`].

mod builtin;
pub mod command;
pub mod completion;
pub mod config;
mod dispatch;
pub mod env;
pub mod error;
pub mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod registry;
pub mod signal;

pub use command::{Arity, CommandSpec, Context, ExitCode, Shell};
pub use completion::{Completion, CompletionResolver};
pub use config::{EofPolicy, SessionConfig};
pub use env::Environment;
pub use error::{Interrupted, ShellError, SyntaxError};
pub use external::{ExternalRunner, SystemShell};
pub use io_adapters::{
    InteractiveSource, LineSource, ReadEvent, Scripted, ScriptedSource, StreamSource,
};
pub use registry::Registry;
pub use signal::InterruptFlag;

/// The command loop; see [`Session::run`].
pub use interpreter::Session;

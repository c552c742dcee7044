//! Commands every session has: `exit`, `close` and `help`.

use crate::command::{Arity, Context};
use crate::registry::{Registry, names_with_prefix};
use anyhow::Result;

/// Built-in commands every session knows about.
///
/// Builtins only touch the session through its [`Context`], so they work for
/// any shell type.
pub(crate) trait BuiltinCommand {
    /// Canonical name of the command, e.g. "exit" or "help".
    fn name() -> &'static str;

    fn aliases() -> &'static [&'static str] {
        &[]
    }

    fn arity() -> Arity;

    /// One-line description shown in the command listing.
    fn summary() -> &'static str;

    /// Extended help shown by `help <name>`.
    fn help() -> Option<&'static str> {
        None
    }

    fn execute<S>(ctx: &mut Context<'_, S>, params: &[String]) -> Result<()>;
}

fn install<T: BuiltinCommand + 'static, S: 'static>(registry: &mut Registry<S>) {
    let spec = registry.command(T::name(), T::arity(), |_shell: &mut S, ctx, params| {
        T::execute(ctx, params)
    });
    spec.describe(T::summary());
    for alias in T::aliases() {
        spec.alias(*alias);
    }
    if let Some(text) = T::help() {
        spec.help(move || text.to_string());
    }
}

pub(crate) fn register<S: 'static>(registry: &mut Registry<S>) {
    install::<Exit, S>(registry);
    install::<Close, S>(registry);
    install::<Help, S>(registry);
}

/// Let `help` complete its argument with the names in the finished table.
pub(crate) fn attach_help_completion<S: 'static>(registry: &mut Registry<S>) {
    let names: Vec<String> = registry.names().map(str::to_string).collect();
    let Some(help) = registry.find_mut(Help::name()) else {
        return;
    };
    if help.has_completer() {
        return;
    }
    help.completer(move |params, index| {
        let partial = params.get(index).map(String::as_str).unwrap_or_default();
        Ok(names_with_prefix(names.iter().map(String::as_str), partial))
    });
}

pub(crate) struct Exit;

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn arity() -> Arity {
        Arity::NONE
    }

    fn summary() -> &'static str {
        "Terminates the command interpreter"
    }

    fn execute<S>(ctx: &mut Context<'_, S>, _params: &[String]) -> Result<()> {
        log::debug!("Terminating interpreter...");
        ctx.exit();
        Ok(())
    }
}

pub(crate) struct Close;

impl BuiltinCommand for Close {
    fn name() -> &'static str {
        "close"
    }

    fn arity() -> Arity {
        Arity::NONE
    }

    fn summary() -> &'static str {
        "Terminates the currently running shell"
    }

    fn help() -> Option<&'static str> {
        Some(
            "Terminates the currently running shell\n\
             If this shell was opened from another shell, control returns to \
             the parent shell, which keeps running",
        )
    }

    fn execute<S>(ctx: &mut Context<'_, S>, _params: &[String]) -> Result<()> {
        log::debug!("Closing shell ({})", ctx.prompt());
        ctx.close();
        Ok(())
    }
}

pub(crate) struct Help;

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn aliases() -> &'static [&'static str] {
        &["?"]
    }

    fn arity() -> Arity {
        Arity::range(0, 1)
    }

    fn summary() -> &'static str {
        "Online help generation (this command)"
    }

    fn help() -> Option<&'static str> {
        Some(
            "Online help generation tool\n\
             Running 'help' with no parameters displays a list of supported commands\n\
             Passing any supported command to 'help' provides detailed help on the command\n\
             example: help exit",
        )
    }

    fn execute<S>(ctx: &mut Context<'_, S>, params: &[String]) -> Result<()> {
        match params.first() {
            None => list_commands(ctx),
            Some(name) => show_command_help(ctx, name),
        }
    }
}

fn list_commands<S>(ctx: &mut Context<'_, S>) -> Result<()> {
    log::debug!("Showing help for available commands...");
    let prompt = ctx.prompt().to_string();
    let headers = ["Command", "Description", "Extended Help"];
    let rows: Vec<[String; 3]> = ctx
        .commands()
        .describe()
        .into_iter()
        .map(|info| {
            let extended = if info.has_help {
                format!("`{}help {}`", prompt, info.name)
            } else {
                "N/A".to_string()
            };
            [info.name, info.summary, extended]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = widths.map(|w| "-".repeat(w));
    writeln!(ctx.out, "{}", format_row(&headers.map(str::to_string), &widths))?;
    writeln!(ctx.out, "{}", format_row(&rule, &widths))?;
    for row in &rows {
        writeln!(ctx.out, "{}", format_row(row, &widths))?;
    }

    if let Some(escape) = ctx.config().escape {
        writeln!(ctx.out)?;
        writeln!(
            ctx.out,
            "Lines starting with {escape} are passed to the system shell (e.g. {escape}ls)"
        )?;
    }
    Ok(())
}

fn format_row(cells: &[String; 3], widths: &[usize; 3]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn show_command_help<S>(ctx: &mut Context<'_, S>, name: &str) -> Result<()> {
    let found = ctx
        .commands()
        .find(name)
        .map(|spec| (spec.help_text(), spec.summary().map(str::to_string)));

    match found {
        None => writeln!(ctx.out, "Command does not exist: {name}")?,
        Some((Some(text), _)) => writeln!(ctx.out, "{text}")?,
        Some((None, summary)) => {
            writeln!(ctx.out, "No online help for command \"{name}\"")?;
            if let Some(summary) = summary {
                writeln!(ctx.out, "{summary}")?;
            }
        }
    }
    Ok(())
}

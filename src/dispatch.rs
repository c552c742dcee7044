//! Turning a tokenized line into a handler call.

use crate::command::Context;
use crate::error::{Interrupted, ShellError};
use crate::lexer::ParsedLine;

/// Resolve, validate and invoke the command named on `parsed`.
///
/// # Arguments
/// * `shell` - State of the shell the command operates on.
/// * `ctx` - Session context handed to the handler.
/// * `parsed` - The tokenized line.
///
/// # Returns
/// `Ok(())` when the handler completed. Otherwise the [`ShellError`] to report;
/// the handler is not invoked for lookup and arity failures. A Ctrl-C while
/// the handler runs turns its result into [`ShellError::Interrupted`].
pub(crate) fn dispatch<S>(
    shell: &mut S,
    ctx: &mut Context<'_, S>,
    parsed: &ParsedLine,
) -> Result<(), ShellError> {
    let registry = ctx.commands();
    let name = parsed.command();
    let Some(spec) = registry.find(name) else {
        log::debug!("No command registered as {name}");
        return Err(ShellError::CommandNotFound { name: name.to_string() });
    };

    spec.arity().check(spec.name(), parsed.params().len())?;

    let params = parsed.param_values();
    log::debug!("Running {} with {:?}", spec.name(), params);
    let result = spec.invoke(shell, ctx, &params);
    let interrupted = ctx.interrupt.take();
    match result {
        Err(source) if !interrupted && !is_interrupt(&source) => Err(ShellError::HandlerFailure {
            command: spec.name().to_string(),
            source,
        }),
        Ok(()) if !interrupted => Ok(()),
        _ => Err(ShellError::Interrupted {
            command: spec.name().to_string(),
        }),
    }
}

/// `true` when `err` or anything it wraps is a user interrupt.
pub(crate) fn is_interrupt(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.is::<Interrupted>()
            || cause
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::Interrupted)
    })
}

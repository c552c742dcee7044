//! Error taxonomy reported by the command loop.
//!
//! None of these errors terminate a session on their own. The session reports
//! a one-line summary to its output and keeps the details for `log::debug!`.

use thiserror::Error;

/// Marker error a command handler returns when the user aborted it.
///
/// The dispatcher recognises it anywhere in an `anyhow` chain and treats the
/// command as interrupted instead of failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation interrupted by user")]
pub struct Interrupted;

/// A line could not be tokenized into a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid syntax at column {column}: {line}")]
pub struct SyntaxError {
    /// The offending input line.
    pub line: String,
    /// Byte offset of the offending character.
    pub offset: usize,
    /// 1-based character column of the offending character.
    pub column: usize,
}

impl SyntaxError {
    pub(crate) fn at(line: &str, offset: usize) -> Self {
        let column = line[..offset].chars().count() + 1;
        Self {
            line: line.to_string(),
            offset,
            column,
        }
    }

    /// Caret pointer aligned under the offending character.
    pub fn caret(&self) -> String {
        format!("{}^", " ".repeat(self.column - 1))
    }
}

/// Errors raised while turning a line into a dispatched command.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The tokenizer rejected the line.
    #[error("Parsing error: {0}")]
    InvalidSyntax(#[from] SyntaxError),

    /// No command or alias with this name is registered.
    #[error("Command not found: {name}")]
    CommandNotFound { name: String },

    /// The number of parameters is outside the command's declared arity.
    #[error("{}", format_arity_mismatch(command, *required, *max, *provided))]
    ArityMismatch {
        command: String,
        required: usize,
        max: Option<usize>,
        provided: usize,
    },

    /// The handler ran and returned an error.
    #[error("Error running {command}: {source}")]
    HandlerFailure {
        command: String,
        #[source]
        source: anyhow::Error,
    },

    /// The handler was aborted by the user.
    #[error("Command {command} interrupted")]
    Interrupted { command: String },
}

fn format_arity_mismatch(
    command: &str,
    required: usize,
    max: Option<usize>,
    provided: usize,
) -> String {
    let expected = match max {
        Some(max) if max == required => format!("{required}"),
        Some(max) => format!("{required} to {max}"),
        None => format!("at least {required}"),
    };
    format!("Command {command} requires {expected} parameters but {provided} were provided.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_points_at_column() {
        let err = SyntaxError::at("exit!", 4);
        assert_eq!(err.column, 5);
        assert_eq!(err.caret(), "    ^");
    }

    #[test]
    fn column_counts_characters_not_bytes() {
        let line = "é!";
        let err = SyntaxError::at(line, 2);
        assert_eq!(err.column, 2);
        assert_eq!(err.caret(), " ^");
    }

    #[test]
    fn arity_messages() {
        let exact = ShellError::ArityMismatch {
            command: "greet".into(),
            required: 1,
            max: Some(1),
            provided: 2,
        };
        assert_eq!(
            exact.to_string(),
            "Command greet requires 1 parameters but 2 were provided."
        );

        let ranged = ShellError::ArityMismatch {
            command: "greet".into(),
            required: 1,
            max: Some(3),
            provided: 0,
        };
        assert!(ranged.to_string().contains("1 to 3"));

        let variadic = ShellError::ArityMismatch {
            command: "echo".into(),
            required: 2,
            max: None,
            provided: 1,
        };
        assert!(variadic.to_string().contains("at least 2"));
    }
}

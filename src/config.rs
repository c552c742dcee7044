//! Per-session settings.

/// What a session does when its input source runs out of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EofPolicy {
    /// Finish this session only; a parent session keeps reading.
    #[default]
    Close,
    /// Finish this session and every ancestor, like the `exit` command.
    Exit,
}

/// Presentation and behaviour settings of a session.
///
/// `Default` gives the stock shell: `"> "` prompt, no banner, `!` as the shell
/// escape, variable expansion on, scripted input echoed after the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Text shown before the cursor when reading a command.
    pub prompt: String,
    /// Text written once when the session starts, before the first prompt.
    pub banner: Option<String>,
    /// Leading character that routes a line to the system shell. `None` disables it.
    pub escape: Option<char>,
    pub eof: EofPolicy,
    /// Expand whole-word `$NAME` references before tokenizing.
    pub expand_variables: bool,
    /// Write `prompt + line` for every line read from a non-interactive source.
    pub echo_input: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            banner: None,
            escape: Some('!'),
            eof: EofPolicy::Close,
            expand_variables: true,
            echo_input: true,
        }
    }
}

impl SessionConfig {
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    pub fn with_escape(mut self, escape: Option<char>) -> Self {
        self.escape = escape;
        self
    }

    pub fn with_eof(mut self, eof: EofPolicy) -> Self {
        self.eof = eof;
        self
    }

    pub fn with_expand_variables(mut self, enabled: bool) -> Self {
        self.expand_variables = enabled;
        self
    }

    pub fn with_echo_input(mut self, enabled: bool) -> Self {
        self.echo_input = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.prompt, "> ");
        assert_eq!(config.banner, None);
        assert_eq!(config.escape, Some('!'));
        assert_eq!(config.eof, EofPolicy::Close);
        assert!(config.expand_variables);
    }

    #[test]
    fn builder_overrides() {
        let config = SessionConfig::default()
            .with_prompt("sub> ")
            .with_banner("hello")
            .with_escape(None)
            .with_eof(EofPolicy::Exit)
            .with_echo_input(false);
        assert_eq!(config.prompt, "sub> ");
        assert_eq!(config.banner.as_deref(), Some("hello"));
        assert_eq!(config.escape, None);
        assert_eq!(config.eof, EofPolicy::Exit);
        assert!(!config.echo_input);
    }
}

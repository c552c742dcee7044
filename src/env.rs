//! Variables and working directory a session hands to its commands.

use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("valid word pattern"));

static VAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$([A-Za-z_][A-Za-z0-9_]*)$").expect("valid variable pattern")
});

/// User-level view of the process environment owned by a session.
///
/// The environment contains:
/// - `vars`: variables available for `$NAME` expansion and passed to external commands.
/// - `current_dir`: the working directory for external commands.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Variables by name. Seeded from the process, editable by commands.
    pub vars: HashMap<String, String>,
    /// The current working directory for external commands.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Snapshot of the process variables and working directory.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// An environment with no variables, rooted at the current directory.
    pub fn empty() -> Self {
        Self {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Session value of `key`, or the process value when the session has none.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Replace every whitespace-delimited word of the form `$NAME` with the
    /// variable's value.
    ///
    /// Works on the raw line, before quote-aware tokenization. References to
    /// unknown variables and `$NAME` embedded in longer words are left alone.
    pub fn expand<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let mut expanded = String::new();
        let mut copied_to = 0;

        for word in WORD.find_iter(line) {
            let Some(caps) = VAR_REF.captures(word.as_str()) else {
                continue;
            };
            let Some(value) = self.get_var(&caps[1]) else {
                log::debug!("Leaving unknown variable {} unexpanded", word.as_str());
                continue;
            };
            expanded.push_str(&line[copied_to..word.start()]);
            expanded.push_str(&value);
            copied_to = word.end();
        }

        if copied_to == 0 {
            return Cow::Borrowed(line);
        }
        expanded.push_str(&line[copied_to..]);
        Cow::Owned(expanded)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

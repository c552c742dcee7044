//! Tab completion: turns the token under the cursor into replacement
//! candidates, and plugs them into the rustyline editor.

use crate::command::CompleterFn;
use crate::lexer;
use crate::registry::{Registry, names_with_prefix};
use rustyline::Helper;
use rustyline::completion::Completer;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// Result of resolving completions for one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The command has no completion function, or the line could not be parsed.
    NoHandler,
    /// The completion function returned an error.
    Failed,
    Matches(Vec<String>),
}

impl Completion {
    pub fn candidates(&self) -> &[String] {
        match self {
            Completion::Matches(matches) => matches,
            Completion::NoHandler | Completion::Failed => &[],
        }
    }

    pub fn into_candidates(self) -> Vec<String> {
        match self {
            Completion::Matches(matches) => matches,
            Completion::NoHandler | Completion::Failed => Vec::new(),
        }
    }
}

struct Entry {
    name: String,
    aliases: Vec<String>,
    completer: Option<Rc<CompleterFn>>,
}

struct CachedMatches {
    line: String,
    begin: usize,
    matches: Vec<String>,
}

/// Completion state of one session.
///
/// Holds a snapshot of the command table taken when the session was built,
/// plus the matches of the last request so the editor can fetch them one at a
/// time.
pub struct CompletionResolver {
    entries: Vec<Entry>,
    cache: RefCell<Option<CachedMatches>>,
    computations: Cell<usize>,
}

impl CompletionResolver {
    pub(crate) fn new<S>(registry: &Registry<S>) -> Self {
        let entries = registry
            .iter()
            .map(|spec| Entry {
                name: spec.name().to_string(),
                aliases: spec.aliases().to_vec(),
                completer: spec.completer_fn(),
            })
            .collect();
        Self {
            entries,
            cache: RefCell::new(None),
            computations: Cell::new(0),
        }
    }

    /// Registered command names starting with `partial`, aliases excluded.
    pub fn command_names(&self, partial: &str) -> Vec<String> {
        names_with_prefix(self.entries.iter().map(|e| e.name.as_str()), partial)
    }

    /// Candidates for the token spanning `begin..end` of `line`.
    ///
    /// # Arguments
    /// * `line` - The whole input line.
    /// * `begin` - Byte offset where the token under the cursor starts.
    /// * `end` - Byte offset of the cursor.
    ///
    /// # Returns
    /// Full replacement strings for `line[begin..end]`, wrapped in quotes when
    /// the token was opened with one or the candidate holds whitespace. A
    /// candidate that no quoting reads back unchanged is left out. A completer
    /// that errors or panics yields [`Completion::Failed`].
    pub fn resolve(&self, line: &str, begin: usize, end: usize) -> Completion {
        if begin > end || !line.is_char_boundary(begin) || !line.is_char_boundary(end) {
            log::debug!("Ignoring completion request with bad range {begin}..{end}");
            return Completion::NoHandler;
        }

        let partial = &line[begin..end];
        if line[..begin].trim().is_empty() {
            return Completion::Matches(self.command_names(partial));
        }

        let parsed = match lexer::tokenize(&line[..end]) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::debug!("Not completing unparsable line {line:?}: {err}");
                return Completion::NoHandler;
            }
        };
        let Some(completer) = self.completer_for(parsed.command()) else {
            return Completion::NoHandler;
        };

        let tokens = parsed.params();
        let mut params = parsed.param_values();
        let (index, quote) = match tokens.iter().position(|t| t.start() == begin) {
            Some(index) => (index, tokens[index].quote()),
            None if partial.trim().is_empty() => {
                params.push(String::new());
                (params.len() - 1, None)
            }
            None => {
                log::debug!("Cursor at {begin} does not start a parameter of {line:?}");
                return Completion::NoHandler;
            }
        };

        match panic::catch_unwind(AssertUnwindSafe(|| completer(&params, index))) {
            Ok(Ok(candidates)) => Completion::Matches(
                candidates
                    .into_iter()
                    .filter_map(|candidate| requote(candidate, quote))
                    .collect(),
            ),
            Ok(Err(err)) => {
                log::debug!("Completion for {} failed: {err:?}", parsed.command());
                Completion::Failed
            }
            Err(_) => {
                log::warn!("Completion for {} panicked", parsed.command());
                Completion::Failed
            }
        }
    }

    /// The `index`-th candidate for the token `begin..end` of `line`.
    ///
    /// Index 0, or a token different from the previous request, computes the
    /// matches afresh; later indices are served from the cached result. Returns
    /// `None` past the last candidate.
    pub fn candidate(&self, line: &str, begin: usize, end: usize, index: usize) -> Option<String> {
        let key = line.get(..end).unwrap_or(line);
        let cached = self
            .cache
            .borrow()
            .as_ref()
            .is_some_and(|c| c.line == key && c.begin == begin);

        if index == 0 || !cached {
            self.computations.set(self.computations.get() + 1);
            let matches = self.resolve(line, begin, end).into_candidates();
            *self.cache.borrow_mut() = Some(CachedMatches {
                line: key.to_string(),
                begin,
                matches,
            });
        }

        self.cache
            .borrow()
            .as_ref()
            .and_then(|c| c.matches.get(index).cloned())
    }

    /// How many times matches have been computed by [`CompletionResolver::candidate`].
    pub fn computations(&self) -> usize {
        self.computations.get()
    }

    fn completer_for(&self, command: &str) -> Option<Rc<CompleterFn>> {
        self.entries
            .iter()
            .find(|e| e.name == command)
            .or_else(|| self.entries.iter().find(|e| e.aliases.iter().any(|a| a == command)))
            .and_then(|e| e.completer.clone())
    }
}

/// Spell `candidate` so the lexer reads it back as one token with that value.
///
/// The quote the user opened is kept unless the candidate contains it.
fn requote(candidate: String, quote: Option<char>) -> Option<String> {
    let bare = !candidate.is_empty()
        && !candidate.starts_with(['\'', '"'])
        && !candidate.chars().any(char::is_whitespace);
    if quote.is_none() && bare {
        return Some(candidate);
    }

    let preferred = quote.unwrap_or('"');
    let other = if preferred == '"' { '\'' } else { '"' };
    match [preferred, other].into_iter().find(|q| !candidate.contains(*q)) {
        Some(q) => Some(format!("{q}{candidate}{q}")),
        None if bare => Some(candidate),
        None => {
            log::debug!("Dropping completion {candidate:?}: it cannot be quoted");
            None
        }
    }
}

/// Byte offset where the token under the cursor at `pos` starts.
///
/// Quote aware: inside an open quote the token starts at the quote.
pub fn token_start(line: &str, pos: usize) -> usize {
    let Some(head) = line.get(..pos) else {
        return pos;
    };
    match lexer::scan(head).last() {
        Some(token) if token.end() == pos => token.start(),
        _ => pos,
    }
}

/// rustyline helper feeding the editor from a session's resolver.
#[derive(Default)]
pub struct ShellHelper {
    resolver: Option<Rc<CompletionResolver>>,
}

impl ShellHelper {
    pub fn new(resolver: Rc<CompletionResolver>) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }
}

impl Completer for ShellHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let start = token_start(line, pos);
        let Some(resolver) = &self.resolver else {
            return Ok((start, Vec::new()));
        };
        let candidates = (0..)
            .map_while(|index| resolver.candidate(line, start, pos, index))
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

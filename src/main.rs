use anyhow::{Context as _, Result, anyhow};
use argh::{EarlyExit, FromArgs};
use cmdloop::{Arity, Registry, Session, SessionConfig, Shell};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

#[derive(FromArgs)]
/// Demo command shell with nested sub-shells and tab completion.
struct Args {
    /// run commands from this file instead of the terminal
    #[argh(option, short = 's')]
    script: Option<PathBuf>,

    /// prompt to show before each command
    #[argh(option, short = 'p')]
    prompt: Option<String>,

    /// log debug output to stderr
    #[argh(switch, short = 'v')]
    verbose: bool,
}

#[derive(FromArgs)]
/// Count the words given, or their characters.
struct Count {
    /// count characters instead of words
    #[argh(switch, short = 'c')]
    chars: bool,

    #[argh(positional)]
    /// words to count
    words: Vec<String>,
}

const NAMES: [&str; 4] = ["alice", "bob", "carol", "dave"];

/// Top level shell of the demo.
#[derive(Default)]
struct Demo {
    greeted: Vec<String>,
}

impl Shell for Demo {
    fn commands(registry: &mut Registry<Self>) {
        registry
            .command("echo", Arity::at_least(0), |_, ctx, params| {
                writeln!(ctx.out, "{}", params.join(" "))?;
                Ok(())
            })
            .describe("Print the parameters, separated by single spaces");

        registry
            .command("greet", Arity::range(1, 2), |demo, ctx, params| {
                let greeting = params.get(1).map(String::as_str).unwrap_or("Hello");
                writeln!(ctx.out, "{greeting}, {}!", params[0])?;
                demo.greeted.push(params[0].clone());
                Ok(())
            })
            .alias("hi")
            .describe("Greet someone")
            .help(|| {
                "greet <name> [greeting]\n\
                 Prints a greeting for <name>. Names of the demo users complete with TAB."
                    .to_string()
            })
            .completer(|params, index| {
                if index > 0 {
                    return Ok(Vec::new());
                }
                Ok(NAMES
                    .iter()
                    .filter(|name| name.starts_with(params[index].as_str()))
                    .map(|name| name.to_string())
                    .collect())
            });

        registry
            .command("greeted", Arity::NONE, |demo, ctx, _| {
                for name in &demo.greeted {
                    writeln!(ctx.out, "{name}")?;
                }
                Ok(())
            })
            .describe("List everyone greeted so far");

        registry
            .command("count", Arity::at_least(0), |_, ctx, params| {
                let args: Vec<&str> = params.iter().map(String::as_str).collect();
                let count = match Count::from_args(&["count"], &args) {
                    Ok(count) => count,
                    Err(EarlyExit { output, status }) => {
                        write!(ctx.out, "{output}")?;
                        return status.map_err(|()| anyhow!("invalid arguments for count"));
                    }
                };
                let total = if count.chars {
                    count.words.iter().map(|w| w.chars().count()).sum::<usize>()
                } else {
                    count.words.len()
                };
                writeln!(ctx.out, "{total}")?;
                Ok(())
            })
            .describe("Count words or characters (see `count --help`)");

        registry
            .command("set", Arity::exact(2), |_, ctx, params| {
                ctx.env_mut().set_var(params[0].as_str(), params[1].as_str());
                Ok(())
            })
            .describe("Set a variable for $NAME expansion");

        registry
            .command("notes", Arity::NONE, |_, ctx, _| {
                let mut child = Session::new(Notes::default());
                ctx.run_nested(&mut child);
                let notes = child.into_shell().notes;
                writeln!(ctx.out, "{} note(s) taken", notes.len())?;
                Ok(())
            })
            .describe("Open the note taking sub-shell");
    }

    fn config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_prompt("demo> ")
            .with_banner("cmdloop demo. Type `help` to list commands, `exit` to quit.")
    }
}

/// Nested shell opened by `notes`.
#[derive(Default)]
struct Notes {
    notes: Vec<String>,
}

impl Shell for Notes {
    fn commands(registry: &mut Registry<Self>) {
        registry
            .command("add", Arity::at_least(1), |notes, _, params| {
                notes.notes.push(params.join(" "));
                Ok(())
            })
            .describe("Add a note");

        registry
            .command("list", Arity::NONE, |notes, ctx, _| {
                for (i, note) in notes.notes.iter().enumerate() {
                    writeln!(ctx.out, "{}. {note}", i + 1)?;
                }
                Ok(())
            })
            .describe("Show every note");
    }

    fn config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_prompt("notes> ")
            .with_banner("Taking notes. `close` goes back, `exit` quits everything.")
    }
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let demo = Demo::default();
    let mut config = demo.config();
    if let Some(prompt) = args.prompt {
        config = config.with_prompt(prompt);
    }
    let mut session = Session::with_config(demo, config);

    match args.script {
        Some(path) => {
            let file =
                File::open(&path).with_context(|| format!("cannot open {}", path.display()))?;
            let mut out = io::stdout();
            session.run_stream(BufReader::new(file), &mut out);
        }
        None => session
            .run_interactive()
            .map_err(|err| anyhow!("terminal error: {err}"))?,
    }
    Ok(())
}

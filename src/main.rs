//! antirec CLI: anti-recommendation resolution and navigation.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use antirec::config::EngineConfig;
use antirec::engine::Engine;
use antirec::history::UserId;
use antirec::navigation::NavigationEngine;
use antirec::paths::AntirecPaths;
use antirec::record::{Item, RecordKey};

#[derive(Parser)]
#[command(name = "antirec", version, about = "Anti-recommendation engine")]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/antirec/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog file, overriding the config.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show engine info and statistics.
    Info,

    /// Resolve anti-recommendations for one record, without navigating.
    Resolve {
        /// Record key.
        key: String,

        /// User whose history filters the result.
        #[arg(long, default_value = "local")]
        user: String,
    },

    /// Print the eager path graph.
    Walk {
        /// Key to start the walk from.
        #[arg(long)]
        seed: Option<String>,
    },

    /// Interactive navigation: `next <key>`, `prev`, `init`, `reset <user>`, `quit`.
    Browse {
        #[arg(long, default_value = "local")]
        user: String,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = AntirecPaths::resolve().ok();
    let mut config = match (&cli.config, &paths) {
        (Some(path), _) => EngineConfig::load(path)?,
        (None, Some(paths)) => EngineConfig::load_or_default(&paths.config_file())?,
        (None, None) => EngineConfig::default(),
    };
    if let Some(catalog) = cli.catalog {
        config.catalog = Some(catalog);
    }

    let engine = Engine::new(config, paths.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("{}", engine.info());
        }

        Commands::Resolve { key, user } => {
            let key = parse_key(&key)?;
            let user = parse_user(&user)?;
            let recs = engine.anti_recommendations(&key, &user)?;
            if recs.is_empty() {
                println!("No anti-recommendations for \"{key}\".");
            }
            for (i, rec) in recs.iter().enumerate() {
                let marker = if i == 0 { "*" } else { " " };
                println!("{marker} {}  {}", rec.key, rec.url);
            }
        }

        Commands::Walk { seed } => {
            let seed = seed.as_deref().map(parse_key).transpose()?;
            let path = engine.path_graph(seed.as_ref())?;
            for frame in path.frames() {
                let candidates: Vec<&str> =
                    frame.candidates.iter().map(RecordKey::as_str).collect();
                println!("{} -> {}", frame.subject, candidates.join(", "));
            }
            println!(
                "{} frames, {} records visited",
                path.len(),
                path.visit_order().len()
            );
        }

        Commands::Browse { user } => {
            let mut nav = engine.navigator(parse_user(&user)?);
            let stdin = std::io::stdin();
            browse(&mut nav, stdin.lock(), &mut std::io::stdout())?;
        }
    }

    Ok(())
}

fn browse(
    nav: &mut NavigationEngine,
    mut input: impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let items = nav.initial()?;
    print_items(out, "initial", &items).into_diagnostic()?;

    while let Some(line) = read_command(&mut input, out, nav.user())? {
        let line = line.trim();
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));

        let outcome: Result<()> = match command {
            "" => continue,
            "quit" | "q" => break,
            "init" => nav
                .initial()
                .map_err(Into::into)
                .and_then(|items| print_items(out, "initial", &items).into_diagnostic()),
            "next" | "n" => parse_key(arg).and_then(|key| {
                let items = nav.next(&key)?;
                print_items(out, "next", &items).into_diagnostic()
            }),
            "prev" | "p" => nav
                .previous()
                .map_err(Into::into)
                .and_then(|items| print_items(out, "previous", &items).into_diagnostic()),
            "reset" => parse_user(arg).and_then(|user| {
                nav.reset(user);
                writeln!(out, "navigation reset for {}", nav.user()).into_diagnostic()
            }),
            other => writeln!(out, "unknown command: {other}").into_diagnostic(),
        };
        // A failed command is reported; the session stays open.
        if let Err(report) = outcome {
            writeln!(out, "error: {report}").into_diagnostic()?;
        }
    }
    if nav.stale_references() > 0 {
        eprintln!("{} stale reference(s) skipped", nav.stale_references());
    }
    Ok(())
}

/// Print the prompt and read one line; `None` at end of input.
fn read_command(
    input: &mut impl BufRead,
    out: &mut impl Write,
    user: &UserId,
) -> Result<Option<String>> {
    write!(out, "{user}> ").into_diagnostic()?;
    out.flush().into_diagnostic()?;
    let mut line = String::new();
    if input.read_line(&mut line).into_diagnostic()? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn print_items(out: &mut impl Write, label: &str, items: &[Item]) -> std::io::Result<()> {
    if items.is_empty() {
        return writeln!(out, "{label}: (nothing)");
    }
    writeln!(out, "{label}:")?;
    for item in items {
        match &item.url {
            Some(url) => writeln!(out, "  {}  {url}", item.key)?,
            None => writeln!(out, "  {}", item.key)?,
        }
    }
    Ok(())
}

fn parse_key(raw: &str) -> Result<RecordKey> {
    RecordKey::new(raw).ok_or_else(|| miette::miette!("record key must not be blank"))
}

fn parse_user(raw: &str) -> Result<UserId> {
    UserId::new(raw).ok_or_else(|| miette::miette!("user id must not be blank"))
}

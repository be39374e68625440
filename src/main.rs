mod app;
mod calendar;
mod config;
mod geometry;
mod help;
mod pipeline;
mod preview;
mod render;
mod scheduler;
mod surface;
mod theme;
use crate::app::App;
use crate::config::Content;
use crate::pipeline::{Pipeline, RunOutcome};
use crate::render::RunCache;
use crate::surface::MemorySurface;
use anyhow::Context;
use lexopt::{Arg, Parser};
use ratatui::DefaultTerminal;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run {
        content: PathBuf,
        page: PathBuf,
        once: bool,
        log: Option<PathBuf>,
        verbosity: u8,
    },
    Help,
    Version,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut once = false;
        let mut log = None;
        let mut verbosity = 0u8;
        let mut paths = Vec::new();
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('v') | Arg::Long("verbose") => verbosity = verbosity.saturating_add(1),
                Arg::Long("once") => once = true,
                Arg::Long("log") => log = Some(PathBuf::from(parser.value()?)),
                Arg::Value(value) if paths.len() < 2 => paths.push(PathBuf::from(value)),
                _ => return Err(arg.unexpected()),
            }
        }
        let mut paths = paths.into_iter();
        let (Some(content), Some(page)) = (paths.next(), paths.next()) else {
            return Err(lexopt::Error::from("expected a content file and a page file"));
        };
        Ok(Command::Run {
            content,
            page,
            once,
            log,
            verbosity,
        })
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run {
                content,
                page,
                once,
                log,
                verbosity,
            } => {
                init_logging(verbosity, once, log.as_deref())?;
                let content = load_content(&content)?;
                let mut page = load_page(&page)?;
                let pipeline = Pipeline::new(&content);
                if once {
                    match pipeline.run(&mut page, &mut RunCache::default()) {
                        RunOutcome::Rendered(report) => print!("{report}"),
                        RunOutcome::Skipped(reason) => println!("Skipped: {reason}"),
                    }
                    Ok(())
                } else {
                    with_terminal(|mut terminal| {
                        terminal.hide_cursor().context("failed to hide cursor")?;
                        App::new(pipeline, page).run(&mut terminal)?;
                        Ok(())
                    })
                }
            }
            Command::Help => {
                println!("Usage: daygrid [<options>] <CONTENT.json> <PAGE.json>");
                println!();
                println!("Paint the target date's month onto the day cells of a page snapshot");
                println!();
                println!("Options:");
                println!("  --once            Run the calendar once and print the grid instead of");
                println!("                    opening the preview");
                println!("  --log <FILE>      Write log messages to the given file");
                println!("  -v, --verbose     Log more; may be given up to three times");
                println!("  -h, --help        Display this help message and exit");
                println!("  -V, --version     Show the program version and exit");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env())?.run()
}

fn load_content(path: &Path) -> anyhow::Result<Content> {
    let src = fs::read_to_string(path)
        .with_context(|| format!("failed to read content file {}", path.display()))?;
    Content::from_json(&src)
        .with_context(|| format!("failed to parse content file {}", path.display()))
}

fn load_page(path: &Path) -> anyhow::Result<MemorySurface> {
    let src = fs::read_to_string(path)
        .with_context(|| format!("failed to read page file {}", path.display()))?;
    MemorySurface::from_json(&src)
        .with_context(|| format!("failed to parse page file {}", path.display()))
}

/// Logs go to `log` if given, else to stderr in `--once` mode.  The
/// interactive preview owns the terminal, so without a log file it logs
/// nothing.
fn init_logging(verbosity: u8, once: bool, log: Option<&Path>) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);
    if let Some(path) = log {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if once {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, lexopt::Error> {
        Command::from_parser(Parser::from_iter(
            std::iter::once("daygrid").chain(args.iter().copied()),
        ))
    }

    #[test]
    fn test_parse_run() {
        let cmd = parse(&["-vv", "--once", "content.json", "page.json"]).unwrap();
        assert_eq!(
            cmd,
            Command::Run {
                content: PathBuf::from("content.json"),
                page: PathBuf::from("page.json"),
                once: true,
                log: None,
                verbosity: 2,
            }
        );
    }

    #[test]
    fn test_parse_log() {
        let cmd = parse(&["--log", "run.log", "a.json", "b.json"]).unwrap();
        assert!(matches!(cmd, Command::Run { log: Some(ref p), once: false, .. } if p == Path::new("run.log")));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&["content.json"]).is_err());
        assert!(parse(&["a.json", "b.json", "c.json"]).is_err());
        assert!(parse(&["--bogus", "a.json", "b.json"]).is_err());
    }

    #[test]
    fn test_parse_help() {
        assert_eq!(parse(&["a.json", "--help"]).unwrap(), Command::Help);
        assert_eq!(parse(&["-V"]).unwrap(), Command::Version);
    }
}

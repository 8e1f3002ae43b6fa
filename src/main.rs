//! Purpose: `dstmerge` CLI entry point.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit stable stdout formats (JSON summaries or raw DST bytes).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Logs go to stderr so stdout stays machine readable.
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{
    Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tempfile::NamedTempFile;
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod serve;

use dstmerge::api::{
    ComposedWord, DirSource, Error, ErrorKind, HttpSource, Letter, LetterSource, compose_word,
    letters_string, to_exit_code,
};
use dstmerge::letter_paths::{LETTERS_DIR_ENV, default_letters_dir, resolve_letter_path};
use dstmerge::notice::{Notice, notice_json, unterminated_notices};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::InvalidInput)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Run `dstmerge --help` for usage."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    command_dispatch::dispatch_command(cli.command, color_mode).map_err(|err| (err, color_mode))
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or("invalid arguments");
    first
        .trim_start_matches("error:")
        .trim()
        .to_string()
}

#[derive(Parser)]
#[command(
    name = "dstmerge",
    version,
    about = "Merge per-letter DST embroidery files into one word file",
    long_about = None,
    after_help = r#"EXAMPLES
  $ dstmerge merge Hello                     # writes HELLO.dst from ./letters/{H,E,L,O}.dst
  $ dstmerge merge "C1A!B" --out designs/    # writes designs/CAB.dst
  $ dstmerge merge hi --base-url https://example.com/letters/ --out - > HI.dst
  $ dstmerge serve --letters-dir ./letters   # GET /v0/merge/<word> downloads <WORD>.dst

ENVIRONMENT
  DSTMERGE_LETTERS_DIR   default letter directory (fallback: ./letters)
  RUST_LOG               log filter for stderr diagnostics"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        global = true,
        help = "Colorize error output: auto, always, never"
    )]
    color: ColorMode,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Merge the letters of WORD into one DST file")]
    Merge {
        #[arg(help = "Word to compose; non-letters are ignored, case is folded")]
        word: String,
        #[command(flatten)]
        source: SourceArgs,
        #[arg(
            long,
            short = 'o',
            help = "Output file, directory, or - for stdout (default: ./<WORD>.dst)",
            value_hint = ValueHint::AnyPath
        )]
        out: Option<PathBuf>,
        #[arg(long, help = "Overwrite an existing output file")]
        force: bool,
    },
    #[command(about = "Serve merged words over HTTP as downloads")]
    Serve {
        #[arg(long, default_value = "127.0.0.1:9710", help = "Bind address (host:port)")]
        bind: String,
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, help = "Allow binding to a non-loopback address")]
        allow_non_loopback: bool,
    },
    #[command(about = "List the letter table and which letter files are present")]
    Letters {
        #[arg(
            long,
            help = "Letter directory (default: $DSTMERGE_LETTERS_DIR or ./letters)",
            value_hint = ValueHint::DirPath
        )]
        letters_dir: Option<PathBuf>,
    },
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Clone, Debug)]
struct SourceArgs {
    #[arg(
        long,
        help = "Letter directory (default: $DSTMERGE_LETTERS_DIR or ./letters)",
        value_hint = ValueHint::DirPath,
        conflicts_with = "base_url"
    )]
    letters_dir: Option<PathBuf>,
    #[arg(
        long,
        help = "Fetch letters over HTTP(S) from <URL>/<L>.dst",
        value_hint = ValueHint::Url
    )]
    base_url: Option<String>,
}

impl SourceArgs {
    fn into_source(self) -> Result<Arc<dyn LetterSource>, Error> {
        if let Some(base_url) = self.base_url {
            return Ok(Arc::new(HttpSource::new(base_url)?));
        }
        let letters_dir = self.letters_dir.unwrap_or_else(default_letters_dir);
        Ok(Arc::new(DirSource::new().with_letters_dir(letters_dir)))
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

fn init_tracing(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn build_runtime() -> Result<tokio::runtime::Runtime, Error> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to start runtime")
                .with_source(err)
        })
}

enum OutputTarget {
    Stdout,
    File(PathBuf),
}

fn resolve_output_target(out: Option<PathBuf>, file_name: &str) -> OutputTarget {
    match out {
        Some(path) if path.as_os_str() == "-" => OutputTarget::Stdout,
        Some(path) if path.is_dir() => OutputTarget::File(path.join(file_name)),
        Some(path) => OutputTarget::File(path),
        None => OutputTarget::File(PathBuf::from(file_name)),
    }
}

// Stage in a sibling temp file and rename into place; a failed write leaves no target.
fn write_output(path: &Path, bytes: &[u8], force: bool) -> Result<(), Error> {
    let io_error = |message: &str, err: io::Error| {
        Error::new(ErrorKind::Io)
            .with_message(message)
            .with_path(path)
            .with_source(err)
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir)
        .map_err(|err| io_error("failed to create output file", err))?;
    staged
        .write_all(bytes)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|err| io_error("failed to write output file", err))?;

    let persisted = if force {
        staged.persist(path)
    } else {
        staged.persist_noclobber(path)
    };
    match persisted {
        Ok(_) => Ok(()),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
            Err(Error::new(ErrorKind::AlreadyExists)
                .with_message("output file already exists")
                .with_path(path)
                .with_hint("Re-run with --force to overwrite or choose a different --out."))
        }
        Err(err) => Err(io_error("failed to write output file", err.error)),
    }
}

fn write_stdout(bytes: &[u8]) -> Result<(), Error> {
    let mut stdout = io::stdout().lock();
    let result = match stdout.write_all(bytes) {
        Ok(()) => stdout.flush(),
        Err(err) => Err(err),
    };
    result.map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write stdout")
            .with_source(err)
    })
}

fn merge_summary_json(composed: &ComposedWord, path: Option<&Path>) -> Value {
    let mut summary = Map::new();
    summary.insert("word".to_string(), json!(composed.word));
    summary.insert(
        "letters".to_string(),
        json!(letters_string(&composed.letters)),
    );
    summary.insert("file".to_string(), json!(composed.file_name));
    if let Some(path) = path {
        summary.insert("path".to_string(), json!(path.display().to_string()));
    }
    summary.insert("bytes".to_string(), json!(composed.bytes.len()));
    summary.insert(
        "inputs".to_string(),
        serde_json::to_value(&composed.report.inputs).unwrap_or(Value::Null),
    );
    Value::Object(summary)
}

fn letters_table_json(letters_dir: &Path) -> Value {
    let entries = Letter::all()
        .map(|letter| {
            let path = resolve_letter_path(letter, letters_dir);
            json!({
                "letter": letter.as_char().to_string(),
                "resource": letter.resource_path(),
                "path": path.display().to_string(),
                "present": path.is_file(),
            })
        })
        .collect::<Vec<_>>();
    json!({
        "letters_dir": letters_dir.display().to_string(),
        "env": LETTERS_DIR_ENV,
        "letters": entries,
    })
}

fn emit_json(value: Value) {
    let pretty = io::stdout().is_terminal();
    let encoded = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    let json = encoded.unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_notices(composed: &ComposedWord, cmd: &str, color_mode: ColorMode) {
    let time = notice_time_now().unwrap_or_default();
    for notice in unterminated_notices(composed, cmd, &time) {
        emit_notice(&notice, color_mode);
    }
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        eprintln!("{label} {} (word: {})", notice.message, notice.word);
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::InvalidInput => "invalid input".to_string(),
        ErrorKind::ResourceUnavailable => "letter file unavailable".to_string(),
        ErrorKind::EmptyMergeSet => "nothing to merge".to_string(),
        ErrorKind::TruncatedHeader => "letter file shorter than the dst header".to_string(),
        ErrorKind::AlreadyExists => "already exists".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(letter) = err.letter() {
        inner.insert("letter".to_string(), json!(letter.to_string()));
    }
    if let Some(index) = err.index() {
        inner.insert("index".to_string(), json!(index));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(letter) = err.letter() {
        lines.push(format!(
            "{} {letter}",
            colorize_label("letter:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(index) = err.index() {
        lines.push(format!(
            "{} {index}",
            colorize_label("index:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    for cause in error_causes(err) {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}

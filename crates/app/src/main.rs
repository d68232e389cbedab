use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::UserId;
use services::{Clock, QuizSession};
use storage::DEFAULT_WORKSHEET;
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;
use url::Url;

mod driver;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidUrl { flag: &'static str, raw: String },
    InvalidUid { raw: String },
    EmptyWorksheet,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUrl { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidUid { raw } => write!(f, "invalid user id: {raw:?}"),
            ArgsError::EmptyWorksheet => write!(f, "--worksheet must not be empty"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_url(flag: &'static str, raw: String) -> Result<Url, ArgsError> {
    Url::parse(&raw).map_err(|_| ArgsError::InvalidUrl { flag, raw })
}

fn parse_uid(raw: String) -> Result<UserId, ArgsError> {
    UserId::parse(raw.clone()).map_err(|_| ArgsError::InvalidUid { raw })
}

/// Where progress rows live.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Backend {
    Sqlite(String),
    Remote { base: Url, api_key: Option<String> },
}

#[derive(Debug)]
struct Args {
    bank: PathBuf,
    backend: Backend,
    worksheet: String,
    uid: Option<UserId>,
    share_base: Option<Url>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [play] [options]");
    eprintln!("  cargo run -p app -- whoami [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --bank <path>         question bank JSON (default questions.json)");
    eprintln!("  --db <sqlite_url>     local progress store (default sqlite://quiz.sqlite3)");
    eprintln!("  --remote <url>        remote worksheet service; overrides --db");
    eprintln!("  --worksheet <name>    worksheet holding user rows (default {DEFAULT_WORKSHEET})");
    eprintln!("  --uid <token>         resume progress for this user id");
    eprintln!("  --share-url <url>     resume from a share link carrying ?uid=");
    eprintln!("  --share-base <url>    base for printed share links");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_BANK, QUIZ_DB_URL, QUIZ_REMOTE_URL, QUIZ_REMOTE_KEY, QUIZ_UID,");
    eprintln!("  QUIZ_SHARE_BASE, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    WhoAmI,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "whoami" => Some(Self::WhoAmI),
            _ => None,
        }
    }
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        Self::parse_with_env(args, |key| std::env::var(key).ok())
    }

    fn parse_with_env(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut bank = env("QUIZ_BANK").map_or_else(|| PathBuf::from("questions.json"), PathBuf::from);
        let mut db_url = env("QUIZ_DB_URL").map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut remote = env("QUIZ_REMOTE_URL")
            .map(|raw| parse_url("QUIZ_REMOTE_URL", raw))
            .transpose()?;
        let api_key = env("QUIZ_REMOTE_KEY").filter(|key| !key.trim().is_empty());
        let mut uid = env("QUIZ_UID").map(parse_uid).transpose()?;
        let mut share_base = env("QUIZ_SHARE_BASE")
            .map(|raw| parse_url("QUIZ_SHARE_BASE", raw))
            .transpose()?;
        let mut worksheet = DEFAULT_WORKSHEET.to_owned();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bank" => bank = PathBuf::from(require_value(args, "--bank")?),
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--remote" => remote = Some(parse_url("--remote", require_value(args, "--remote")?)?),
                "--worksheet" => {
                    let value = require_value(args, "--worksheet")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::EmptyWorksheet);
                    }
                    worksheet = value;
                }
                "--uid" => uid = Some(parse_uid(require_value(args, "--uid")?)?),
                "--share-url" => {
                    let link = parse_url("--share-url", require_value(args, "--share-url")?)?;
                    let from_link = UserId::from_share_url(&link).ok_or_else(|| ArgsError::InvalidUid {
                        raw: link.to_string(),
                    })?;
                    uid = Some(from_link);
                }
                "--share-base" => {
                    share_base = Some(parse_url("--share-base", require_value(args, "--share-base")?)?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let backend = match remote {
            Some(base) => Backend::Remote { base, api_key },
            None => Backend::Sqlite(db_url),
        };

        Ok(Self {
            bank,
            backend,
            worksheet,
            uid,
            share_base,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn open_storage(args: &Args) -> Result<Storage, Box<dyn std::error::Error>> {
    match &args.backend {
        Backend::Sqlite(db_url) => {
            // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
            prepare_sqlite_file(db_url)?;
            tracing::info!(db = %db_url, worksheet = %args.worksheet, "using local progress store");
            Ok(Storage::sqlite(db_url, &args.worksheet).await?)
        }
        Backend::Remote { base, api_key } => {
            tracing::info!(remote = %base, worksheet = %args.worksheet, "using remote progress store");
            Ok(Storage::http(base.clone(), api_key.clone(), &args.worksheet)?)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let user = match parsed.uid.clone() {
        Some(user) => user,
        None => {
            let user = UserId::generate();
            tracing::info!(user_id = %user, "issued a new user id");
            user
        }
    };

    match cmd {
        Command::WhoAmI => {
            println!("{user}");
            if let Some(base) = &parsed.share_base {
                println!("{}", user.share_url(base));
            }
            Ok(())
        }
        Command::Play => {
            let storage = open_storage(&parsed).await?;
            let session = QuizSession::open(
                &parsed.bank,
                user,
                Arc::clone(&storage.progress),
                Clock::default(),
            )
            .await?;
            driver::run(session, parsed.share_base.as_ref()).await?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

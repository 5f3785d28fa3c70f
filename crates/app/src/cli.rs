use std::fmt;
use std::path::PathBuf;

use services::DEFAULT_AREA_LIMIT;
use tutor_core::model::Difficulty;

use crate::config::Config;

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingValue { flag: &'static str },
    MissingFlag { command: &'static str, flag: &'static str },
    UnknownArg(String),
    InvalidCount { raw: String },
    InvalidDifficulty { raw: String },
    InvalidDbUrl { raw: String },
    ConflictingOutcome,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "missing subcommand"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { command, flag } => write!(f, "{command} requires {flag}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid -n value: {raw}"),
            ArgsError::InvalidDifficulty { raw } => write!(f, "invalid --difficulty value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::ConflictingOutcome => write!(f, "use only one of --correct and --incorrect"),
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

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  tutor stats    [--db <sqlite_url>] [--key <storage_key>]");
    eprintln!("  tutor summary");
    eprintln!("  tutor weak     [-n <count>]  # default 5");
    eprintln!("  tutor strong   [-n <count>]");
    eprintln!("  tutor quiz     --file <path> --subject <s> --topic <t> [--difficulty easy|medium|hard]");
    eprintln!("  tutor review   --file <path> [--difficulty easy|medium|hard]");
    eprintln!("  tutor record   --subject <s> --topic <t> (--correct | --incorrect)");
    eprintln!("  tutor reset");
    eprintln!();
    eprintln!("Quiz answers are read from stdin, one letter per line.");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://tutor.sqlite3");
    eprintln!("  --key default");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TUTOR_DB_URL, TUTOR_STORAGE_KEY, TUTOR_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Stats,
    Summary,
    Weak {
        count: usize,
    },
    Strong {
        count: usize,
    },
    Quiz {
        file: PathBuf,
        subject: String,
        topic: String,
        difficulty: Difficulty,
    },
    Review {
        file: PathBuf,
        difficulty: Difficulty,
    },
    Record {
        subject: String,
        topic: String,
        was_correct: bool,
    },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub command: Command,
    pub db_url: String,
    pub storage_key: String,
}

/// Flags collected before they are checked against the subcommand.
#[derive(Default)]
struct Flags {
    count: Option<usize>,
    file: Option<PathBuf>,
    subject: Option<String>,
    topic: Option<String>,
    difficulty: Option<Difficulty>,
    outcome: Option<bool>,
}

impl Args {
    /// Parse `argv` (without the program name). Flags override `config`.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError` for unknown subcommands or flags, missing values,
    /// or flags a subcommand requires but did not get.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        config: &Config,
    ) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter();
        let name = args.next().ok_or(ArgsError::MissingCommand)?;
        if matches!(name.as_str(), "--help" | "-h" | "help") {
            return Ok(Self {
                command: Command::Help,
                db_url: normalize_sqlite_url(config.db_url.clone()),
                storage_key: config.storage_key.clone(),
            });
        }

        let mut db_url = config.db_url.clone();
        let mut storage_key = config.storage_key.clone();
        let mut flags = Flags::default();
        let mut help = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--key" => storage_key = require_value(&mut args, "--key")?,
                "-n" => {
                    let value = require_value(&mut args, "-n")?;
                    let parsed = value
                        .parse::<usize>()
                        .map_err(|_| ArgsError::InvalidCount { raw: value.clone() })?;
                    flags.count = Some(parsed);
                }
                "--file" => flags.file = Some(require_value(&mut args, "--file")?.into()),
                "--subject" => flags.subject = Some(require_value(&mut args, "--subject")?),
                "--topic" => flags.topic = Some(require_value(&mut args, "--topic")?),
                "--difficulty" => {
                    let value = require_value(&mut args, "--difficulty")?;
                    let parsed = value
                        .parse::<Difficulty>()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: value.clone() })?;
                    flags.difficulty = Some(parsed);
                }
                "--correct" | "--incorrect" => {
                    let was_correct = arg == "--correct";
                    if flags.outcome.is_some_and(|o| o != was_correct) {
                        return Err(ArgsError::ConflictingOutcome);
                    }
                    flags.outcome = Some(was_correct);
                }
                "--help" | "-h" => help = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = if help {
            Command::Help
        } else {
            build_command(&name, flags)?
        };

        Ok(Self {
            command,
            db_url: normalize_sqlite_url(db_url),
            storage_key,
        })
    }
}

fn build_command(name: &str, flags: Flags) -> Result<Command, ArgsError> {
    let count = flags.count.unwrap_or(DEFAULT_AREA_LIMIT);
    let difficulty = flags.difficulty.unwrap_or_default();

    let command = match name {
        "stats" => Command::Stats,
        "summary" => Command::Summary,
        "weak" => Command::Weak { count },
        "strong" => Command::Strong { count },
        "quiz" => Command::Quiz {
            file: flags.file.ok_or(ArgsError::MissingFlag {
                command: "quiz",
                flag: "--file",
            })?,
            subject: flags.subject.ok_or(ArgsError::MissingFlag {
                command: "quiz",
                flag: "--subject",
            })?,
            topic: flags.topic.ok_or(ArgsError::MissingFlag {
                command: "quiz",
                flag: "--topic",
            })?,
            difficulty,
        },
        "review" => Command::Review {
            file: flags.file.ok_or(ArgsError::MissingFlag {
                command: "review",
                flag: "--file",
            })?,
            difficulty,
        },
        "record" => Command::Record {
            subject: flags.subject.ok_or(ArgsError::MissingFlag {
                command: "record",
                flag: "--subject",
            })?,
            topic: flags.topic.ok_or(ArgsError::MissingFlag {
                command: "record",
                flag: "--topic",
            })?,
            was_correct: flags.outcome.ok_or(ArgsError::MissingFlag {
                command: "record",
                flag: "--correct or --incorrect",
            })?,
        },
        "reset" => Command::Reset,
        other => return Err(ArgsError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

pub fn normalize_sqlite_url(raw: String) -> String {
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

/// Create the database file (and its directory) if it does not exist yet.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            db_url: "sqlite::memory:".into(),
            storage_key: "default".into(),
            log_level: "info".into(),
        }
    }

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(args.iter().map(|a| (*a).to_string()), &config())
    }

    #[test]
    fn parses_simple_commands_with_defaults() {
        let args = parse(&["stats"]).unwrap();
        assert_eq!(args.command, Command::Stats);
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.storage_key, "default");

        assert_eq!(parse(&["weak"]).unwrap().command, Command::Weak { count: 5 });
        assert_eq!(
            parse(&["strong", "-n", "5"]).unwrap().command,
            Command::Strong { count: 5 }
        );
    }

    #[test]
    fn flags_override_config() {
        let args = parse(&["summary", "--key", "alice", "--db", "sqlite:///tmp/t.db"]).unwrap();
        assert_eq!(args.storage_key, "alice");
        assert_eq!(args.db_url, "sqlite:///tmp/t.db");
    }

    #[test]
    fn quiz_requires_file_subject_and_topic() {
        let args = parse(&[
            "quiz",
            "--file",
            "q.json",
            "--subject",
            "Math",
            "--topic",
            "Fractions",
            "--difficulty",
            "HARD",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Command::Quiz {
                file: PathBuf::from("q.json"),
                subject: "Math".into(),
                topic: "Fractions".into(),
                difficulty: Difficulty::Hard,
            }
        );

        assert_eq!(
            parse(&["quiz", "--file", "q.json", "--topic", "Fractions"]).unwrap_err(),
            ArgsError::MissingFlag {
                command: "quiz",
                flag: "--subject"
            }
        );
    }

    #[test]
    fn record_needs_exactly_one_outcome() {
        assert_eq!(
            parse(&["record", "--subject", "Math", "--topic", "A", "--incorrect"])
                .unwrap()
                .command,
            Command::Record {
                subject: "Math".into(),
                topic: "A".into(),
                was_correct: false,
            }
        );
        assert_eq!(
            parse(&["record", "--subject", "M", "--topic", "A", "--correct", "--incorrect"])
                .unwrap_err(),
            ArgsError::ConflictingOutcome
        );
        assert!(matches!(
            parse(&["record", "--subject", "M", "--topic", "A"]).unwrap_err(),
            ArgsError::MissingFlag { .. }
        ));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse(&[]).unwrap_err(), ArgsError::MissingCommand);
        assert_eq!(
            parse(&["dance"]).unwrap_err(),
            ArgsError::UnknownCommand("dance".into())
        );
        assert_eq!(
            parse(&["stats", "--verbose"]).unwrap_err(),
            ArgsError::UnknownArg("--verbose".into())
        );
        assert_eq!(
            parse(&["weak", "-n"]).unwrap_err(),
            ArgsError::MissingValue { flag: "-n" }
        );
        assert!(matches!(
            parse(&["weak", "-n", "many"]).unwrap_err(),
            ArgsError::InvalidCount { .. }
        ));
        assert!(matches!(
            parse(&["review", "--file", "q.json", "--difficulty", "extreme"]).unwrap_err(),
            ArgsError::InvalidDifficulty { .. }
        ));
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(parse(&["--help"]).unwrap().command, Command::Help);
        assert_eq!(parse(&["quiz", "-h"]).unwrap().command, Command::Help);
    }

    #[test]
    fn normalizes_relative_sqlite_paths() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///var/db.sqlite3".into()),
            "sqlite:///var/db.sqlite3"
        );
        let url = normalize_sqlite_url("sqlite:tutor.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("/tutor.sqlite3"));
    }
}

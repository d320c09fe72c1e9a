//! Session command values: `--flag=value` lists and the legacy comma form.
//!
//! Each search key has its own clap [`Parser`]. The session key is passed as
//! the binary name and the value is split on whitespace, so
//! `beam_search` + `"--steps=3 --width=2 --eval=cost"` parses like a command
//! line. Every parser shares [`RunArgs`] (`--timeout`, `--seed`, `--debug`).

use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, Args, Parser};

use looptune_kernel::eval::EvalMode;
use looptune_search::strategy::{BeamParams, BeamPhaseV1, GreedyParams, RandomParams};

use crate::runner::{RunOptionsV1, SearchRequestV1, StrategySpecV1};

/// Typed failure for a malformed command value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A token that is not a flag.
    MalformedToken { token: String },
    DuplicateFlag { flag: String },
    MissingFlag { flag: String },
    UnknownFlag { flag: String },
    InvalidValue {
        flag: String,
        value: String,
        detail: String,
    },
    /// Legacy comma form with the wrong number of fields.
    LegacyArity { expected: usize, got: usize },
    /// Any other rejection from the flag parser.
    Rejected { detail: String },
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedToken { token } => {
                write!(f, "malformed token '{token}' (expected --name or --name=value)")
            }
            Self::DuplicateFlag { flag } => write!(f, "flag --{flag} given more than once"),
            Self::MissingFlag { flag } => write!(f, "missing required flag --{flag}"),
            Self::UnknownFlag { flag } => write!(f, "unknown flag --{flag}"),
            Self::InvalidValue {
                flag,
                value,
                detail,
            } => write!(f, "invalid value '{value}' for --{flag}: {detail}"),
            Self::LegacyArity { expected, got } => {
                write!(f, "expected {expected} comma-separated fields, got {got}")
            }
            Self::Rejected { detail } => write!(f, "rejected command: {detail}"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Context string clap attached to `kind`, if any. Lists yield their first entry.
fn context(err: &clap::Error, kind: ContextKind) -> Option<String> {
    match err.get(kind)? {
        ContextValue::String(s) => Some(s.clone()),
        ContextValue::Strings(v) => v.first().cloned(),
        _ => None,
    }
}

/// `--width <WIDTH>`, `--debug[=<DEBUG>]` and `--width=3` all name `width`.
fn flag_name(rendered: &str) -> String {
    rendered
        .trim_start_matches('-')
        .split([' ', '=', '<', '['])
        .next()
        .unwrap_or_default()
        .to_string()
}

impl From<clap::Error> for CommandError {
    fn from(err: clap::Error) -> Self {
        let arg = context(&err, ContextKind::InvalidArg).unwrap_or_default();
        let first_line = || err.to_string().lines().next().unwrap_or_default().to_string();
        match err.kind() {
            ErrorKind::MissingRequiredArgument => Self::MissingFlag {
                flag: flag_name(&arg),
            },
            ErrorKind::UnknownArgument if !arg.starts_with("--") => {
                Self::MalformedToken { token: arg }
            }
            ErrorKind::UnknownArgument => Self::UnknownFlag {
                flag: flag_name(&arg),
            },
            ErrorKind::ArgumentConflict => Self::DuplicateFlag {
                flag: flag_name(&arg),
            },
            ErrorKind::InvalidValue | ErrorKind::ValueValidation => Self::InvalidValue {
                flag: flag_name(&arg),
                value: context(&err, ContextKind::InvalidValue).unwrap_or_default(),
                detail: first_line(),
            },
            _ => Self::Rejected {
                detail: first_line(),
            },
        }
    }
}

fn parse_eval_mode(value: &str) -> Result<EvalMode, String> {
    value.parse().map_err(|e: looptune_kernel::eval::EvalError| e.to_string())
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value.parse().map_err(|_| "expected seconds".to_string())?;
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

/// Flags every search key accepts.
#[derive(Args, Debug, Clone, Copy)]
pub struct RunArgs {
    /// Search timeout in (fractional) seconds.
    #[arg(long, value_parser = parse_seconds)]
    pub timeout: Option<Duration>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Dump the search graph as DOT at debug level.
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub debug: bool,
}

impl From<RunArgs> for RunOptionsV1 {
    fn from(args: RunArgs) -> Self {
        Self {
            timeout: args.timeout,
            seed: args.seed,
            debug: args.debug,
        }
    }
}

/// `greedy_search` flag form.
#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
pub struct GreedyArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub steps: i64,
    #[arg(long, allow_negative_numbers = true)]
    pub lookahead: i64,
    #[arg(long)]
    pub width: usize,
    #[arg(long, value_parser = parse_eval_mode)]
    pub eval: EvalMode,
    #[command(flatten)]
    pub run: RunArgs,
}

/// `beam_search` and `beam_bfs_search`.
#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
pub struct BeamArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub steps: i64,
    #[arg(long)]
    pub width: usize,
    #[arg(long, value_parser = parse_eval_mode)]
    pub eval: EvalMode,
    /// Rank candidates with the evaluator instead of sampling them.
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "true",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub ranking: bool,
    #[command(flatten)]
    pub run: RunArgs,
}

impl BeamArgs {
    fn params(&self) -> BeamParams {
        BeamParams {
            num_steps: self.steps,
            search_width: self.width,
            eval_mode: self.eval,
            ranking: self.ranking,
        }
    }
}

/// `beambeam_search`.
#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
pub struct BeamBeamArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub steps1: i64,
    #[arg(long)]
    pub width1: usize,
    #[arg(long, value_parser = parse_eval_mode)]
    pub eval1: EvalMode,
    #[arg(long, allow_negative_numbers = true)]
    pub steps2: i64,
    #[arg(long)]
    pub width2: usize,
    #[arg(long, value_parser = parse_eval_mode)]
    pub eval2: EvalMode,
    #[command(flatten)]
    pub run: RunArgs,
}

/// `random_search`.
#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
pub struct RandomArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub steps: i64,
    #[arg(long, default_value = "loop_nest", value_parser = parse_eval_mode)]
    pub eval: EvalMode,
    #[command(flatten)]
    pub run: RunArgs,
}

/// Parse `value` as the flags of session key `key`.
fn parse_value<P: Parser>(key: &str, value: &str) -> Result<P, CommandError> {
    Ok(P::try_parse_from(
        std::iter::once(key).chain(value.split_whitespace()),
    )?)
}

fn invalid(flag: &str, value: &str, detail: &str) -> CommandError {
    CommandError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
        detail: detail.to_string(),
    }
}

/// `greedy_search`: flag form, or legacy `walks,steps,depth,width`.
///
/// # Errors
///
/// Any [`CommandError`] for a malformed value.
pub fn parse_greedy(value: &str) -> Result<SearchRequestV1, CommandError> {
    if value.contains(',') {
        return parse_greedy_legacy(value);
    }
    let args: GreedyArgs = parse_value("greedy_search", value)?;
    Ok(SearchRequestV1 {
        strategy: StrategySpecV1::Greedy(GreedyParams {
            num_steps: args.steps,
            lookahead: args.lookahead,
            search_width: args.width,
            eval_mode: args.eval,
        }),
        options: args.run.into(),
    })
}

fn parse_greedy_legacy(value: &str) -> Result<SearchRequestV1, CommandError> {
    let fields: Vec<&str> = value.split(',').map(str::trim).collect();
    let [walks, steps, depth, width] = fields[..] else {
        return Err(CommandError::LegacyArity {
            expected: 4,
            got: fields.len(),
        });
    };
    let int = |flag: &str, v: &str| -> Result<i64, CommandError> {
        v.parse()
            .map_err(|_| invalid(flag, v, "expected an integer"))
    };
    let count = |flag: &str, v: &str| -> Result<usize, CommandError> {
        v.parse()
            .map_err(|_| invalid(flag, v, "expected a non-negative integer"))
    };
    let walks = u32::try_from(count("walk_count", walks)?)
        .map_err(|_| invalid("walk_count", walks, "too large"))?;
    Ok(SearchRequestV1 {
        strategy: StrategySpecV1::GreedyWalks {
            walks,
            params: GreedyParams {
                num_steps: int("step_count", steps)?,
                lookahead: int("search_depth", depth)?,
                search_width: count("search_width", width)?,
                eval_mode: EvalMode::LoopNest,
            },
        },
        options: RunOptionsV1::default(),
    })
}

/// `beam_search` (depth-first).
///
/// # Errors
///
/// Any [`CommandError`] for a malformed value.
pub fn parse_beam_dfs(value: &str) -> Result<SearchRequestV1, CommandError> {
    let args: BeamArgs = parse_value("beam_search", value)?;
    Ok(SearchRequestV1 {
        strategy: StrategySpecV1::BeamDfs(args.params()),
        options: args.run.into(),
    })
}

/// `beam_bfs_search`.
///
/// # Errors
///
/// Any [`CommandError`] for a malformed value.
pub fn parse_beam_bfs(value: &str) -> Result<SearchRequestV1, CommandError> {
    let args: BeamArgs = parse_value("beam_bfs_search", value)?;
    Ok(SearchRequestV1 {
        strategy: StrategySpecV1::BeamBfs(args.params()),
        options: args.run.into(),
    })
}

/// `beambeam_search`.
///
/// # Errors
///
/// Any [`CommandError`] for a malformed value.
pub fn parse_beam_beam(value: &str) -> Result<SearchRequestV1, CommandError> {
    let args: BeamBeamArgs = parse_value("beambeam_search", value)?;
    Ok(SearchRequestV1 {
        strategy: StrategySpecV1::BeamBeam {
            first: BeamPhaseV1 {
                num_steps: args.steps1,
                search_width: args.width1,
                eval_mode: args.eval1,
            },
            second: BeamPhaseV1 {
                num_steps: args.steps2,
                search_width: args.width2,
                eval_mode: args.eval2,
            },
        },
        options: args.run.into(),
    })
}

/// `random_search`.
///
/// # Errors
///
/// Any [`CommandError`] for a malformed value.
pub fn parse_random(value: &str) -> Result<SearchRequestV1, CommandError> {
    let args: RandomArgs = parse_value("random_search", value)?;
    Ok(SearchRequestV1 {
        strategy: StrategySpecV1::Random(RandomParams {
            num_steps: args.steps,
            eval_mode: args.eval,
        }),
        options: args.run.into(),
    })
}

//! Scripted replays: a plain-text list of day actions fed through a session.
//!
//! Script format, one action per line:
//!
//! ```text
//! # comments and blank lines are ignored
//! buy 1000
//! hold x20        # observe twenty days
//! sell 500
//! next
//! settle          # stop here even if bars remain
//! ```
//!
//! `hold` and `next` are synonyms. Any action takes an optional `xN` repeat
//! suffix. Repeats are kept as a count and replayed lazily, so a large count
//! simply runs until the data ends.

use barreplay_core::{DayAction, Session, SettlementReport};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// One scripted instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptStep {
    Day(DayAction),
    Settle,
}

/// A scripted step, the line it came from and how many times to run it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub step: ScriptStep,
    pub repeat: usize,
}

/// Parsed script, one entry per non-empty line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayScript {
    steps: Vec<ScriptLine>,
}

impl ReplayScript {
    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn steps(&self) -> &[ScriptLine] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl FromStr for ReplayScript {
    type Err = ScriptError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut steps = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let content = raw.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            let (step, repeat) =
                parse_line(content).map_err(|reason| ScriptError::Parse { line, reason })?;
            steps.push(ScriptLine { line, step, repeat });
        }
        Ok(Self { steps })
    }
}

fn parse_line(content: &str) -> Result<(ScriptStep, usize), String> {
    let mut tokens: Vec<&str> = content.split_whitespace().collect();

    let mut repeat = 1usize;
    if let Some(last) = tokens.last() {
        if let Some(count) = last.strip_prefix(['x', 'X']) {
            if !count.is_empty() && count.chars().all(|c| c.is_ascii_digit()) {
                repeat = count
                    .parse()
                    .map_err(|_| format!("repeat count '{count}' is too large"))?;
                if repeat == 0 {
                    return Err("repeat count must be at least 1".into());
                }
                tokens.pop();
            }
        }
    }

    let (verb, args) = match tokens.split_first() {
        Some((verb, args)) => (verb.to_ascii_lowercase(), args),
        None => return Err("missing action".into()),
    };

    let volume = |args: &[&str]| -> Result<u64, String> {
        match args {
            [n] => n
                .parse::<u64>()
                .map_err(|_| format!("'{n}' is not a share volume")),
            [] => Err(format!("'{verb}' needs a share volume")),
            _ => Err(format!("'{verb}' takes exactly one argument")),
        }
    };
    let no_args = |args: &[&str]| -> Result<(), String> {
        if args.is_empty() {
            Ok(())
        } else {
            Err(format!("'{verb}' takes no arguments"))
        }
    };

    let step = match verb.as_str() {
        "buy" => ScriptStep::Day(DayAction::Buy(volume(args)?)),
        "sell" => ScriptStep::Day(DayAction::Sell(volume(args)?)),
        "hold" | "next" => {
            no_args(args)?;
            ScriptStep::Day(DayAction::Observe)
        }
        "settle" => {
            no_args(args)?;
            if repeat != 1 {
                return Err("'settle' cannot be repeated".into());
            }
            ScriptStep::Settle
        }
        other => return Err(format!("unknown action '{other}'")),
    };
    Ok((step, repeat))
}

/// An order the session refused. The day was not consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub line: usize,
    pub day: usize,
    pub action: DayAction,
    pub error: String,
}

/// Why a scripted replay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Settled,
    EndOfData,
    ScriptExhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptOutcome {
    pub report: SettlementReport,
    pub rejections: Vec<Rejection>,
    pub stop: StopReason,
}

/// Feed `script` through `session` and settle.
///
/// A rejected order leaves the session unchanged, so the remaining repeats of
/// that line are skipped after the first rejection.
pub fn run_script(mut session: Session, script: &ReplayScript) -> ScriptOutcome {
    let mut rejections = Vec::new();
    let mut stop = StopReason::ScriptExhausted;

    'script: for &ScriptLine { line, step, repeat } in script.steps() {
        let action = match step {
            ScriptStep::Settle => {
                stop = StopReason::Settled;
                break;
            }
            ScriptStep::Day(action) => action,
        };

        for _ in 0..repeat {
            match session.step(action) {
                Ok(outcome) if outcome.advance.is_end_of_data() => {
                    stop = StopReason::EndOfData;
                    break 'script;
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(line, day = session.day_count(), error = %err, "scripted order rejected");
                    rejections.push(Rejection {
                        line,
                        day: session.day_count(),
                        action,
                        error: err.to_string(),
                    });
                    break;
                }
            }
        }
    }

    let report = session.settle();
    info!(
        ?stop,
        rejected = rejections.len(),
        total_days = report.total_days,
        "script finished"
    );
    ScriptOutcome {
        report,
        rejections,
        stop,
    }
}

//! Inbound command parser.
//!
//! | Line                              | Command                     |
//! |-----------------------------------|-----------------------------|
//! | `ANALYSIS_RESULT TRUE\|FALSE\|1\|0` | `AnalysisResult { eject }` |
//! | `ABORT_ANALYSIS`                  | `AbortAnalysis`             |
//! | `SETTINGS {json}`                 | `ApplySettings(updates)`    |
//! | `GET_STATE`                       | `ReportState`               |
//! | `RESET`                           | `ClearFault`                |
//!
//! Verbs and boolean arguments are case-insensitive.

use core::fmt;

use crate::app::commands::AppCommand;
use crate::config::{ConfigError, SettingsPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Nothing but whitespace.
    Empty,
    /// The verb is not recognised.
    Unknown,
    /// The verb requires an argument that was not given.
    MissingArgument(&'static str),
    /// The argument could not be interpreted.
    InvalidArgument(&'static str),
    /// A `SETTINGS` body was rejected.
    Settings(ConfigError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::Unknown => write!(f, "unknown command"),
            Self::MissingArgument(verb) => write!(f, "{verb} requires an argument"),
            Self::InvalidArgument(verb) => write!(f, "invalid argument for {verb}"),
            Self::Settings(e) => write!(f, "failed to parse settings: {e}"),
        }
    }
}

impl From<ConfigError> for CommandError {
    fn from(e: ConfigError) -> Self {
        Self::Settings(e)
    }
}

const ANALYSIS_RESULT: &str = "ANALYSIS_RESULT";
const ABORT_ANALYSIS: &str = "ABORT_ANALYSIS";
const SETTINGS: &str = "SETTINGS";
const GET_STATE: &str = "GET_STATE";
const RESET: &str = "RESET";

/// Parse one trimmed line from the host.
pub fn parse_line(line: &str) -> Result<AppCommand, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(CommandError::Empty);
    }

    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    if verb.eq_ignore_ascii_case(ANALYSIS_RESULT) {
        parse_verdict(arg).map(|eject| AppCommand::AnalysisResult { eject })
    } else if verb.eq_ignore_ascii_case(ABORT_ANALYSIS) {
        Ok(AppCommand::AbortAnalysis)
    } else if verb.eq_ignore_ascii_case(SETTINGS) {
        if arg.is_empty() {
            return Err(CommandError::MissingArgument(SETTINGS));
        }
        let updates = SettingsPatch::from_json(arg)?.into_updates()?;
        Ok(AppCommand::ApplySettings(updates))
    } else if verb.eq_ignore_ascii_case(GET_STATE) {
        Ok(AppCommand::ReportState)
    } else if verb.eq_ignore_ascii_case(RESET) {
        Ok(AppCommand::ClearFault)
    } else {
        Err(CommandError::Unknown)
    }
}

fn parse_verdict(arg: &str) -> Result<bool, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument(ANALYSIS_RESULT));
    }
    if arg.eq_ignore_ascii_case("TRUE") || arg == "1" {
        Ok(true)
    } else if arg.eq_ignore_ascii_case("FALSE") || arg == "0" {
        Ok(false)
    } else {
        Err(CommandError::InvalidArgument(ANALYSIS_RESULT))
    }
}

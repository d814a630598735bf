use crate::games::mr_white::words::MAX_BATCH;
use std::str::FromStr;
use thiserror::Error;

/// Words queued by a bare `prefetch` or `fallback`.
pub const DEFAULT_BATCH: usize = 5;

/// One facilitator action. Player numbers are converted to 0-based indices here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    Remove(usize),
    Start,
    View(usize),
    Next,
    Eliminate(usize),
    Guess(String),
    NewGame,
    Reset,
    Prefetch(usize),
    Fallback(usize),
    TestGenerator,
    Credential(Option<String>),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}', type 'help' for the list")]
    Unknown(String),
    #[error("'{0}' needs {1}")]
    MissingArgument(&'static str, &'static str),
    #[error("'{0}' is not a player number")]
    BadPlayerNumber(String),
    #[error("'{0}' is not a word count")]
    BadCount(String),
    #[error("at most {max} words at a time, not {0}", max = MAX_BATCH)]
    BatchTooLarge(usize),
}

pub const HELP: &str = "add <name> | remove <n> | start | view <n> | next | eliminate <n> | \
guess <word> | new | reset | prefetch [n] | fallback [n] | test | key <credential>|clear";

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "add" => Command::Add(required(rest, "add", "a name")?.to_string()),
            "remove" | "rm" => Command::Remove(player_number(required(rest, "remove", "a player number")?)?),
            "start" => Command::Start,
            "view" | "card" => Command::View(player_number(required(rest, "view", "a player number")?)?),
            "next" | "continue" => Command::Next,
            "eliminate" | "vote" => {
                Command::Eliminate(player_number(required(rest, "eliminate", "a player number")?)?)
            }
            "guess" => Command::Guess(required(rest, "guess", "a word")?.to_string()),
            "new" => Command::NewGame,
            "reset" => Command::Reset,
            "prefetch" => Command::Prefetch(count(rest)?),
            "fallback" => Command::Fallback(count(rest)?),
            "test" => Command::TestGenerator,
            "key" => match required(rest, "key", "a credential or 'clear'")? {
                "clear" => Command::Credential(None),
                key => Command::Credential(Some(key.to_string())),
            },
            "help" | "?" => Command::Help,
            _ => return Err(ParseError::Unknown(verb.to_string())),
        };
        Ok(command)
    }
}

fn required<'a>(rest: &'a str, verb: &'static str, what: &'static str) -> Result<&'a str, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::MissingArgument(verb, what));
    }
    Ok(rest)
}

/// 1-based on the command line, 0-based everywhere else.
fn player_number(arg: &str) -> Result<usize, ParseError> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(ParseError::BadPlayerNumber(arg.to_string())),
    }
}

fn count(arg: &str) -> Result<usize, ParseError> {
    if arg.is_empty() {
        return Ok(DEFAULT_BATCH);
    }
    parse_batch(arg)
}

/// A word count between 0 and [`MAX_BATCH`].
pub fn parse_batch(arg: &str) -> Result<usize, ParseError> {
    let n: usize = arg.trim().parse().map_err(|_| ParseError::BadCount(arg.to_string()))?;
    if n > MAX_BATCH {
        return Err(ParseError::BatchTooLarge(n));
    }
    Ok(n)
}

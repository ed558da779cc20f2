//! Event-source line protocol
//!
//! Stands in for the firmware's event subscriptions. One event per line:
//!
//! ```text
//! down 12          # position 12 pressed   (alias: press)
//! up 12            # position 12 released  (alias: release)
//! keycode 0x04     # HID usage of the key just pressed
//! layer 1          # highest active layer
//! mods 0x03        # modifier bitmask (LCTL | LSFT)
//! wait 250ms       # replay scripts only
//! ```

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// A single parsed input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLine {
    /// Key position changed
    Position { position: u32, pressed: bool },
    /// Keycode press reported for the last position
    Keycode(u16),
    /// Active layer changed
    Layer(u8),
    /// Modifier state changed
    Modifiers(u8),
    /// Pause before the next line (replay)
    Wait(Duration),
}

/// Errors from parsing input lines
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command: \"{0}\"")]
    UnknownCommand(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("invalid number: \"{0}\"")]
    InvalidNumber(String),
    #[error("invalid delay: \"{0}\" (expected e.g. 250ms or 2s)")]
    InvalidDelay(String),
    #[error("unexpected trailing input: \"{0}\"")]
    TrailingInput(String),
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<InputError>,
    },
}

impl InputError {
    fn at_line(self, line: usize) -> Self {
        InputError::AtLine {
            line,
            source: Box::new(self),
        }
    }
}

/// Parse a decimal or `0x`-prefixed hex number
fn parse_number(s: &str) -> Result<u32, InputError> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|_| InputError::InvalidNumber(s.to_string()))
}

fn parse_narrow<T: TryFrom<u32>>(s: &str) -> Result<T, InputError> {
    T::try_from(parse_number(s)?).map_err(|_| InputError::InvalidNumber(s.to_string()))
}

fn required<'a>(arg: Option<&'a str>, name: &'static str) -> Result<&'a str, InputError> {
    arg.ok_or(InputError::MissingArgument(name))
}

/// Parse a delay like `250ms` or `2s`
fn parse_delay(s: &str) -> Result<Duration, InputError> {
    let invalid = || InputError::InvalidDelay(s.to_string());
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().map(Duration::from_millis).map_err(|_| invalid())
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| invalid())
    } else {
        Err(invalid())
    }
}

impl FromStr for InputLine {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let command = required(words.next(), "command")?.to_ascii_lowercase();
        let arg = words.next();

        let line = match command.as_str() {
            "down" | "press" => InputLine::Position {
                position: parse_number(required(arg, "position")?)?,
                pressed: true,
            },
            "up" | "release" => InputLine::Position {
                position: parse_number(required(arg, "position")?)?,
                pressed: false,
            },
            "keycode" | "kc" => InputLine::Keycode(parse_narrow(required(arg, "keycode")?)?),
            "layer" => InputLine::Layer(parse_narrow(required(arg, "layer")?)?),
            "mods" => InputLine::Modifiers(parse_narrow(required(arg, "modifier bits")?)?),
            "wait" => InputLine::Wait(parse_delay(required(arg, "delay")?)?),
            other => return Err(InputError::UnknownCommand(other.to_string())),
        };

        let rest: Vec<&str> = words.collect();
        if !rest.is_empty() {
            return Err(InputError::TrailingInput(rest.join(" ")));
        }
        Ok(line)
    }
}

/// Parse one raw line. Blank lines and `#` comments yield `None`.
pub fn parse_line(raw: &str) -> Result<Option<InputLine>, InputError> {
    let content = raw.split('#').next().unwrap_or("").trim();
    if content.is_empty() {
        return Ok(None);
    }
    content.parse().map(Some)
}

/// Parse a whole script, tagging errors with their 1-based line number
pub fn parse_script(text: &str) -> Result<Vec<InputLine>, InputError> {
    let mut lines = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        if let Some(line) = parse_line(raw).map_err(|e| e.at_line(idx + 1))? {
            lines.push(line);
        }
    }
    Ok(lines)
}

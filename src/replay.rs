//! Pointer scripts for driving a session without a browser.
//!
//! One command per line; blank lines and lines starting with `#` are skipped:
//!
//! ```text
//! down X Y [primary|middle|secondary]
//! move X Y
//! up X Y
//! wheel X Y DY
//! leave
//! color C
//! ```
//!
//! Coordinates are screen pixels relative to the viewport.

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use std::fs;
use std::io::{self, Read};

use canvas::camera::Point;
use canvas::input::{Button, PointerEvent, WheelDelta};

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayCommand {
    Pointer(PointerEvent),
    Color(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReplayError {
    #[error("line {line}: unknown command `{command}`")]
    UnknownCommand { line: usize, command: String },
    #[error("line {line}: `{command}` takes {expected}")]
    Arity { line: usize, command: String, expected: &'static str },
    #[error("line {line}: invalid number `{value}`")]
    InvalidNumber { line: usize, value: String },
    #[error("line {line}: unknown button `{value}`")]
    UnknownButton { line: usize, value: String },
    #[error("failed to read script {path}: {message}")]
    Read { path: String, message: String },
}

/// Read and parse a script from a file, or stdin for `-`.
///
/// # Errors
///
/// Returns [`ReplayError::Read`] if the input cannot be read, or the first
/// parse error.
pub fn read_script(path: &str) -> Result<Vec<ReplayCommand>, ReplayError> {
    let read_error = |e: io::Error| ReplayError::Read { path: path.to_owned(), message: e.to_string() };
    let text = if path == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).map_err(read_error)?;
        text
    } else {
        fs::read_to_string(path).map_err(read_error)?
    };
    parse_script(&text)
}

/// # Errors
///
/// Returns the first line that fails to parse.
pub fn parse_script(text: &str) -> Result<Vec<ReplayCommand>, ReplayError> {
    let mut commands = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if let Some(command) = parse_line(index + 1, line)? {
            commands.push(command);
        }
    }
    Ok(commands)
}

/// Parse one script line; `None` for blanks and comments.
///
/// # Errors
///
/// Returns a [`ReplayError`] naming `line` for malformed input.
pub fn parse_line(line: usize, text: &str) -> Result<Option<ReplayCommand>, ReplayError> {
    let text = text.trim();
    if text.starts_with('#') {
        return Ok(None);
    }
    let mut words = text.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let arity = |expected: &'static str| ReplayError::Arity { line, command: command.to_owned(), expected };
    let number = |value: &str| -> Result<f64, ReplayError> {
        value
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| ReplayError::InvalidNumber { line, value: value.to_owned() })
    };
    let point = |x: &str, y: &str| -> Result<Point, ReplayError> { Ok(Point::new(number(x)?, number(y)?)) };

    let event = match (command, args.as_slice()) {
        ("down", &[x, y]) => PointerEvent::Down { at: point(x, y)?, button: Button::Primary },
        ("down", &[x, y, button]) => PointerEvent::Down { at: point(x, y)?, button: parse_button(line, button)? },
        ("down", _) => return Err(arity("X Y [BUTTON]")),
        ("move", &[x, y]) => PointerEvent::Move { at: point(x, y)? },
        ("up", &[x, y]) => PointerEvent::Up { at: point(x, y)? },
        ("move" | "up", _) => return Err(arity("X Y")),
        ("wheel", &[x, y, dy]) => PointerEvent::Wheel { at: point(x, y)?, delta: WheelDelta { dx: 0.0, dy: number(dy)? } },
        ("wheel", _) => return Err(arity("X Y DY")),
        ("leave", &[]) => PointerEvent::Leave,
        ("leave", _) => return Err(arity("no arguments")),
        ("color", &[color]) => return Ok(Some(ReplayCommand::Color(color.to_owned()))),
        ("color", _) => return Err(arity("one color")),
        (other, _) => return Err(ReplayError::UnknownCommand { line, command: other.to_owned() }),
    };
    Ok(Some(ReplayCommand::Pointer(event)))
}

fn parse_button(line: usize, value: &str) -> Result<Button, ReplayError> {
    match value.to_ascii_lowercase().as_str() {
        "primary" | "left" => Ok(Button::Primary),
        "middle" => Ok(Button::Middle),
        "secondary" | "right" => Ok(Button::Secondary),
        _ => Err(ReplayError::UnknownButton { line, value: value.to_owned() }),
    }
}

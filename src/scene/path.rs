//! Compound path: one or more closed sub-paths
//!
//! Encoded for persistence as an SVG path string using only absolute
//! `M`, `L`, `A` and `Z` commands, e.g.
//! `M 10 10 L 90 10 L 90 60 Z M 20 100 A 15 15 0 1 0 50 100 A 15 15 0 1 0 20 100 Z`.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathParseError {
    #[error("unsupported path command {0:?} (only absolute M, L, A, Z are used)")]
    UnsupportedCommand(String),
    #[error("command {command} expects {expected} numbers")]
    MissingArguments { command: char, expected: usize },
    #[error("invalid number {0:?}")]
    BadNumber(String),
    #[error("path must start with a move-to")]
    MissingMoveTo,
}

/// One path-drawing command in photo pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    /// Circular arc from the current point to `(x, y)`
    Arc {
        radius: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    },
    Close,
}

/// A list of closed sub-paths, one per authored shape
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundPath {
    commands: Vec<PathCommand>,
}

impl CompoundPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: PathCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of sub-paths (one per move-to)
    pub fn subpath_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo { .. }))
            .count()
    }

    /// Split into sub-paths, each starting at its move-to
    pub fn subpaths(&self) -> Vec<&[PathCommand]> {
        let mut out = Vec::new();
        let mut start = None;
        for (i, command) in self.commands.iter().enumerate() {
            if matches!(command, PathCommand::MoveTo { .. }) {
                if let Some(s) = start {
                    out.push(&self.commands[s..i]);
                }
                start = Some(i);
            }
        }
        if let Some(s) = start {
            out.push(&self.commands[s..]);
        }
        out
    }

    /// Encode as an SVG path string
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        for command in &self.commands {
            if !out.is_empty() {
                out.push(' ');
            }
            // Writing to a String cannot fail
            let _ = match *command {
                PathCommand::MoveTo { x, y } => write!(out, "M {} {}", fmt_num(x), fmt_num(y)),
                PathCommand::LineTo { x, y } => write!(out, "L {} {}", fmt_num(x), fmt_num(y)),
                PathCommand::Arc { radius, large_arc, sweep, x, y } => write!(
                    out,
                    "A {r} {r} 0 {} {} {} {}",
                    large_arc as u8,
                    sweep as u8,
                    fmt_num(x),
                    fmt_num(y),
                    r = fmt_num(radius)
                ),
                PathCommand::Close => write!(out, "Z"),
            };
        }
        out
    }

    /// Parse an SVG path string produced by [`CompoundPath::to_svg`]
    pub fn parse_svg(input: &str) -> Result<Self, PathParseError> {
        let tokens = tokenize(input);
        let mut path = CompoundPath::new();
        let mut i = 0;

        while i < tokens.len() {
            let token = tokens[i];
            i += 1;

            let command = match token {
                "M" | "L" => {
                    let [x, y] = take_numbers::<2>(&tokens, &mut i, token)?;
                    if token == "M" {
                        PathCommand::MoveTo { x, y }
                    } else {
                        PathCommand::LineTo { x, y }
                    }
                }
                "A" => {
                    let [rx, _ry, _rotation, large, sweep, x, y] = take_numbers::<7>(&tokens, &mut i, token)?;
                    PathCommand::Arc {
                        radius: rx,
                        large_arc: large != 0.0,
                        sweep: sweep != 0.0,
                        x,
                        y,
                    }
                }
                "Z" | "z" => PathCommand::Close,
                other => return Err(PathParseError::UnsupportedCommand(other.to_string())),
            };

            if path.is_empty() && !matches!(command, PathCommand::MoveTo { .. }) {
                return Err(PathParseError::MissingMoveTo);
            }
            path.push(command);
        }

        Ok(path)
    }
}

impl fmt::Display for CompoundPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_svg())
    }
}

impl FromStr for CompoundPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_svg(s)
    }
}

/// Two decimals is well below a pixel and keeps stored paths compact
fn fmt_num(v: f32) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == 0.0 {
        // Avoid "-0"
        return "0".to_string();
    }
    format!("{}", rounded)
}

fn tokenize(input: &str) -> Vec<&str> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect()
}

fn take_numbers<const N: usize>(tokens: &[&str], i: &mut usize, command: &str) -> Result<[f32; N], PathParseError> {
    let mut out = [0.0; N];
    for slot in out.iter_mut() {
        let token = tokens.get(*i).ok_or(PathParseError::MissingArguments {
            command: command.chars().next().unwrap_or('?'),
            expected: N,
        })?;
        *slot = token
            .parse::<f32>()
            .map_err(|_| PathParseError::BadNumber(token.to_string()))?;
        *i += 1;
    }
    Ok(out)
}

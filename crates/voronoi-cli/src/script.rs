//! Parser for the CLI's insertion-script mini-format.
//!
//! One instruction per line:
//!   `point <x> <y>`  — insert a point site
//!   `line <i> <j>`   — insert a line-segment site between two earlier point handles
//! Blank lines and lines starting with `#` are ignored.

use anyhow::{anyhow, Context, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Instruction {
    Point(f64, f64),
    Line(usize, usize),
}

/// Parse one non-empty, non-comment line. `lineno` is 1-based, used only for
/// error messages.
pub fn parse_line(lineno: usize, line: &str) -> Result<Instruction> {
    let mut parts = line.split_whitespace();
    let kind = parts
        .next()
        .ok_or_else(|| anyhow!("line {lineno}: empty instruction"))?;
    match kind.to_ascii_lowercase().as_str() {
        "point" => {
            let x: f64 = parts
                .next()
                .ok_or_else(|| anyhow!("line {lineno}: point missing x"))?
                .parse()
                .with_context(|| format!("line {lineno}: invalid x"))?;
            let y: f64 = parts
                .next()
                .ok_or_else(|| anyhow!("line {lineno}: point missing y"))?
                .parse()
                .with_context(|| format!("line {lineno}: invalid y"))?;
            if parts.next().is_some() {
                return Err(anyhow!("line {lineno}: too many fields for point"));
            }
            Ok(Instruction::Point(x, y))
        }
        "line" => {
            let i: usize = parts
                .next()
                .ok_or_else(|| anyhow!("line {lineno}: line missing first handle"))?
                .parse()
                .with_context(|| format!("line {lineno}: invalid first handle"))?;
            let j: usize = parts
                .next()
                .ok_or_else(|| anyhow!("line {lineno}: line missing second handle"))?
                .parse()
                .with_context(|| format!("line {lineno}: invalid second handle"))?;
            if parts.next().is_some() {
                return Err(anyhow!("line {lineno}: too many fields for line"));
            }
            Ok(Instruction::Line(i, j))
        }
        other => Err(anyhow!("line {lineno}: unknown instruction '{other}'")),
    }
}

/// Parse a full script, skipping blank lines and `#` comments. Each surviving
/// line is tagged with its 1-based line number so callers can report parse
/// failures against the original source.
pub fn parse_script(text: &str) -> Vec<(usize, Result<Instruction>)> {
    text.lines()
        .enumerate()
        .map(|(i, raw)| (i + 1, raw.trim()))
        .filter(|(_, trimmed)| !trimmed.is_empty() && !trimmed.starts_with('#'))
        .map(|(lineno, trimmed)| (lineno, parse_line(lineno, trimmed)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_point_and_line_instructions() {
        assert_eq!(parse_line(1, "point 1.0 -2.5").unwrap(), Instruction::Point(1.0, -2.5));
        assert_eq!(parse_line(1, "line 0 3").unwrap(), Instruction::Line(0, 3));
    }

    #[test]
    fn skips_blank_lines_and_comments() {
        let parsed = parse_script("point 0 0\n\n# a comment\nline 0 1\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].0, 1);
        assert_eq!(parsed[1].0, 4);
    }

    #[test]
    fn rejects_unknown_instruction() {
        assert!(parse_line(5, "triangle 1 2 3").is_err());
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!(parse_line(1, "point 1.0").is_err());
        assert!(parse_line(1, "line 1").is_err());
    }
}

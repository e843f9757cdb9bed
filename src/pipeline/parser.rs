//! Text reader for continuous-action examples
//!
//! One example per line:
//!
//! ```text
//! ca 185.1:0.65:0.0062 'tag |user age:0.3 tenure:2 |item price:9.5
//! ```
//!
//! The label section (before the first `|`) is optional. `ca` introduces the
//! label elements `action:cost[:pdf_value]`; an empty action means "no action".

use std::path::Path;

use anyhow::{Context, Result};

use super::error::ParseError;
use super::example::{ContinuousLabelElm, Example, MISSING_ACTION};

const LABEL_TYPE: &str = "ca";

/// Parse a single line. Blank lines yield `None`.
pub fn parse_example(line: &str, line_no: usize) -> Result<Option<Example>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (label_part, feature_part) = match line.find('|') {
        Some(idx) => (&line[..idx], Some(&line[idx + 1..])),
        None => (line, None),
    };

    let mut ec = Example::new();
    parse_label(label_part, line_no, &mut ec)?;
    if let Some(features) = feature_part {
        for section in features.split('|') {
            parse_namespace(section, line_no, &mut ec)?;
        }
    }
    Ok(Some(ec))
}

fn parse_label(part: &str, line_no: usize, ec: &mut Example) -> Result<(), ParseError> {
    let mut tokens = part.split_whitespace().peekable();
    match tokens.peek().copied() {
        Some(LABEL_TYPE) => {
            tokens.next();
        }
        Some(tok) if !tok.starts_with('\'') => {
            return Err(ParseError::UnknownLabelType {
                line: line_no,
                token: tok.to_string(),
            });
        }
        _ => {}
    }

    for token in tokens {
        if let Some(tag) = token.strip_prefix('\'') {
            ec.tag = Some(tag.to_string());
            continue;
        }
        ec.label.costs.push(parse_label_elm(token, line_no)?);
    }
    Ok(())
}

fn parse_label_elm(token: &str, line_no: usize) -> Result<ContinuousLabelElm, ParseError> {
    let malformed = |reason: &str| ParseError::MalformedLabel {
        line: line_no,
        token: token.to_string(),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = token.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(malformed("expected action:cost[:pdf_value]"));
    }

    let action = if parts[0].is_empty() {
        MISSING_ACTION
    } else {
        parts[0]
            .parse::<f32>()
            .map_err(|_| malformed("action is not a number"))?
    };
    let cost = parts[1]
        .parse::<f32>()
        .map_err(|_| malformed("cost is not a number"))?;
    let pdf_value = match parts.get(2) {
        Some(p) => p
            .parse::<f32>()
            .map_err(|_| malformed("pdf_value is not a number"))?,
        None => 0.0,
    };

    Ok(ContinuousLabelElm::new(action, cost, pdf_value))
}

fn parse_namespace(section: &str, line_no: usize, ec: &mut Example) -> Result<(), ParseError> {
    // A name glued to the bar names the namespace; otherwise it is the default one.
    let (ns, body) = if section.starts_with(char::is_whitespace) || section.is_empty() {
        ("", section)
    } else {
        match section.find(char::is_whitespace) {
            Some(idx) => (&section[..idx], &section[idx..]),
            None => (section, ""),
        }
    };

    for token in body.split_whitespace() {
        let (name, value) = match token.split_once(':') {
            Some((name, value)) => {
                let value = value
                    .parse::<f32>()
                    .map_err(|_| ParseError::MalformedFeature {
                        line: line_no,
                        token: token.to_string(),
                    })?;
                (name, value)
            }
            None => (token, 1.0),
        };
        if name.is_empty() {
            return Err(ParseError::MalformedFeature {
                line: line_no,
                token: token.to_string(),
            });
        }
        ec.push_feature(ns, name, value);
    }
    Ok(())
}

/// Parse every non-blank line of `text`. Line numbers in errors are 1-based.
pub fn parse_examples(text: &str) -> Result<Vec<Example>, ParseError> {
    let mut examples = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if let Some(ec) = parse_example(line, idx + 1)? {
            examples.push(ec);
        }
    }
    Ok(examples)
}

/// Load examples from a data file
pub fn read_examples(path: &Path) -> Result<Vec<Example>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;
    parse_examples(&text).with_context(|| format!("Failed to parse data file: {}", path.display()))
}

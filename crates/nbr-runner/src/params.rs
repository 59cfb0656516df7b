//! Parameter-file parsing.
//!
//! One parameter set per line, `KEY=VALUE` tokens separated by whitespace.
//! Values may be single- or double-quoted to embed whitespace:
//!
//! ```text
//! VAR1=VAL1 VAR2="VAL2 with spaces" VAR3=VAL3
//! VAR1=VAL5 VAR2=VAL18 JUPYTER_OUTPUT_SUFFIX=baseline
//! ```

use std::fs;
use std::path::Path;

use nbr_types::{ParameterSet, RunnerError, RunnerResult};

/// Read a parameter file into an ordered sequence of parameter sets.
///
/// No file means "run once, unparameterized": a single empty set. Every
/// line of a present file yields one set, blank lines included. Any
/// malformed line aborts the run before execution starts.
pub fn parse_parameter_file(path: Option<&Path>) -> RunnerResult<Vec<ParameterSet>> {
    let Some(path) = path else {
        return Ok(vec![ParameterSet::new()]);
    };

    let contents = fs::read_to_string(path)?;
    let mut sets = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let set = parse_line(line).map_err(|message| RunnerError::ParameterFile {
            path: path.to_path_buf(),
            line: idx + 1,
            message,
        })?;
        sets.push(set);
    }

    tracing::debug!("Parsed {} parameter set(s) from {}", sets.len(), path.display());
    Ok(sets)
}

/// Parse a single line of `KEY=VALUE` tokens into a parameter set.
fn parse_line(line: &str) -> Result<ParameterSet, String> {
    let mut set = ParameterSet::new();
    for token in split_tokens(line)? {
        let Some(eq) = token.find('=') else {
            return Err(format!("token without '=': {token}"));
        };
        let (key, value) = token.split_at(eq);
        if key.is_empty() {
            return Err(format!("empty variable name in token: {token}"));
        }
        set.insert(key, &value[1..]);
    }
    Ok(set)
}

/// Split a line into whitespace-separated tokens, honoring single and
/// double quotes. Quote characters delimit, they are not part of the value.
fn split_tokens(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                } else {
                    current.push(ch);
                }
            }
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    has_token = true;
                }
                c if c.is_whitespace() => {
                    if has_token {
                        tokens.push(std::mem::take(&mut current));
                        has_token = false;
                    }
                }
                c => {
                    current.push(c);
                    has_token = true;
                }
            },
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

//! Word-level G-code parsing
//!
//! Only what the Z-hop engine needs: the command word, the numeric value that
//! follows an axis letter, and comment stripping. Anything unreadable is
//! reported as absent, never as an error.

use regex::Regex;
use std::sync::OnceLock;

fn comment_regex() -> &'static Regex {
    static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    COMMENT_REGEX.get_or_init(|| Regex::new(r"[;(].*").expect("invalid regex pattern"))
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_REGEX.get_or_init(|| {
        Regex::new(r"(?:^|\s)([A-Z])([-+]?(?:\d+(?:\.\d*)?|\.\d+))").expect("invalid regex pattern")
    })
}

/// Split a raw line into its code part and its `;` comment (without the `;`)
pub fn split_comment(line: &str) -> (&str, Option<&str>) {
    match comment_regex().find(line) {
        Some(m) => {
            let comment = &line[m.start()..];
            let comment = comment
                .strip_prefix(';')
                .or_else(|| comment.strip_prefix('('))
                .unwrap_or(comment);
            (&line[..m.start()], Some(comment.trim()))
        }
        None => (line, None),
    }
}

/// Numeric value following `letter` in the code part of a line
///
/// The letter must start the line or follow whitespace and be followed
/// immediately by an optionally signed decimal number.
pub fn axis_value(line: &str, letter: char) -> Option<f64> {
    let (code, _) = split_comment(line);
    word_regex()
        .captures_iter(code)
        .find(|caps| caps[1].starts_with(letter))
        .and_then(|caps| caps[2].parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Leading command word, e.g. `('G', 1)` for `G01 X10`
pub fn command_word(line: &str) -> Option<(char, u32)> {
    let (code, _) = split_comment(line);
    let token = code.split_whitespace().next()?;
    let mut chars = token.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if !letter.is_ascii_alphabetic() {
        return None;
    }
    let number = chars.as_str().parse::<u32>().ok()?;
    Some((letter, number))
}

/// Replace the value of `letter` in a line, keeping everything else verbatim
///
/// Returns `None` when the letter is not present as a numeric word.
pub fn replace_axis(line: &str, letter: char, formatted: &str) -> Option<String> {
    let (code, _) = split_comment(line);
    let caps = word_regex()
        .captures_iter(code)
        .find(|caps| caps[1].starts_with(letter))?;
    let value = caps.get(2)?;
    let mut out = String::with_capacity(line.len() + formatted.len());
    out.push_str(&line[..value.start()]);
    out.push_str(formatted);
    out.push_str(&line[value.end()..]);
    Some(out)
}

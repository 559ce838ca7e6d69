// src/bundle/minify.rs

//! JavaScript minification for the bundle step.
//!
//! The pipeline only needs "deterministic text transform, applied to the
//! concatenated sources". [`JsMinifier`] does that conservatively in two
//! passes:
//!
//! 1. Strip `/* ... */` and `// ...` comments outside string, template and
//!    regex literals.
//! 2. Collapse whitespace runs. A run containing a line break is kept as a
//!    single `\n` wherever automatic semicolon insertion could depend on it;
//!    otherwise it becomes one space between word characters or disappears.
//!
//! Identifiers are never renamed and no code is removed, so output is
//! behaviourally identical to the input.

use thiserror::Error;

/// Errors that abort the bundle step before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MinifyError {
    #[error("unterminated block comment starting on line {line}")]
    UnterminatedComment { line: usize },

    #[error("unterminated {quote} literal starting on line {line}")]
    UnterminatedString { quote: char, line: usize },

    #[error("unterminated regex literal on line {line}")]
    UnterminatedRegex { line: usize },
}

/// A deterministic text transform applied to the concatenated bundle.
pub trait Minifier: Send + Sync {
    fn minify(&self, source: &str) -> Result<String, MinifyError>;
}

/// Comment-stripping, whitespace-collapsing JavaScript minifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsMinifier;

impl Minifier for JsMinifier {
    fn minify(&self, source: &str) -> Result<String, MinifyError> {
        minify_js(source)
    }
}

/// Identity transform, used when `[bundle].minify = false`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Minifier for Passthrough {
    fn minify(&self, source: &str) -> Result<String, MinifyError> {
        Ok(source.to_string())
    }
}

/// Minifies a JavaScript source string.
pub fn minify_js(input: &str) -> Result<String, MinifyError> {
    let no_comments = strip_comments(input)?;
    Ok(collapse_whitespace(&no_comments))
}

/// Removes comments, keeping line breaks so the whitespace pass can still
/// see statement boundaries.
pub fn strip_comments(input: &str) -> Result<String, MinifyError> {
    let chars: Vec<char> = input.chars().collect();
    let mut output = String::with_capacity(input.len());
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let next = chars.get(i + 1).copied();

        if matches!(ch, '"' | '\'' | '`') {
            let end = scan_string(&chars, i)
                .ok_or(MinifyError::UnterminatedString { quote: ch, line })?;
            copy_literal(&chars[i..end], &mut output, &mut line);
            i = end;
        } else if ch == '/' && next == Some('/') {
            while i < chars.len() && !matches!(chars[i], '\n' | '\r') {
                i += 1;
            }
        } else if ch == '/' && next == Some('*') {
            let start = line;
            i += 2;
            loop {
                match chars.get(i) {
                    None => return Err(MinifyError::UnterminatedComment { line: start }),
                    Some('*') if chars.get(i + 1) == Some(&'/') => {
                        i += 2;
                        break;
                    }
                    Some('\n') => {
                        output.push('\n');
                        line += 1;
                        i += 1;
                    }
                    Some(_) => i += 1,
                }
            }
            // A comment must not glue its neighbours together.
            output.push(' ');
        } else if ch == '/' && regex_allowed(&output) {
            let end = scan_regex(&chars, i).ok_or(MinifyError::UnterminatedRegex { line })?;
            copy_literal(&chars[i..end], &mut output, &mut line);
            i = end;
        } else {
            output.push(ch);
            if ch == '\n' {
                line += 1;
            }
            i += 1;
        }
    }

    Ok(output)
}

/// Collapses unnecessary whitespace outside string, template and regex
/// literals.
pub fn collapse_whitespace(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    let mut pending_newline = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if ch.is_whitespace() {
            pending_space = true;
            if ch == '\n' || ch == '\r' {
                pending_newline = true;
            }
            i += 1;
            continue;
        }

        if pending_space {
            push_separator(&mut out, ch, pending_newline);
            pending_space = false;
            pending_newline = false;
        }

        let literal_end = match ch {
            '"' | '\'' | '`' => scan_string(&chars, i),
            '/' if regex_allowed(&out) => scan_regex(&chars, i),
            _ => None,
        };
        // Unterminated literals were already rejected by `strip_comments`.
        let end = literal_end.unwrap_or(i + 1);
        out.extend(&chars[i..end]);
        i = end;
    }

    out
}

/// Keywords after which `/` starts a regex literal rather than a division.
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

/// Decides whether a `/` following `before` opens a regex literal.
fn regex_allowed(before: &str) -> bool {
    let before = before.trim_end();
    let Some(last) = before.chars().last() else {
        return true;
    };

    if is_word_char(last) {
        let word = &before[before.trim_end_matches(is_word_char).len()..];
        return REGEX_KEYWORDS.contains(&word);
    }

    !matches!(last, ')' | ']' | '"' | '\'' | '`')
}

/// End index (exclusive) of the string literal opening at `start`, or
/// `None` when it is never closed.
fn scan_string(chars: &[char], start: usize) -> Option<usize> {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// End index (exclusive) of the regex literal body opening at `start`.
/// Flags are left to the caller. A line break ends the search.
fn scan_regex(chars: &[char], start: usize) -> Option<usize> {
    let mut in_class = false;
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\n' | '\r' => return None,
            '\\' => i += 1,
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => return Some(i + 1),
            _ => {}
        }
        i += 1;
    }
    None
}

fn copy_literal(literal: &[char], out: &mut String, line: &mut usize) {
    for &c in literal {
        if c == '\n' {
            *line += 1;
        }
        out.push(c);
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '\\'
}

fn ends_statement(ch: char) -> bool {
    is_word_char(ch) || matches!(ch, ')' | ']' | '}' | '"' | '\'' | '`' | '+' | '-')
}

fn may_start_statement(ch: char) -> bool {
    is_word_char(ch)
        || matches!(
            ch,
            '"' | '\'' | '`' | '(' | '[' | '{' | '+' | '-' | '/' | '!' | '~'
        )
}

fn push_separator(out: &mut String, next_char: char, had_newline: bool) {
    let Some(prev_char) = out.chars().last() else {
        return;
    };

    if had_newline && ends_statement(prev_char) && may_start_statement(next_char) {
        out.push('\n');
        return;
    }

    // `a + ++b`, `a - -b`, `x / /re/`: joining would change the tokens.
    if (prev_char == '+' && next_char == '+')
        || (prev_char == '-' && next_char == '-')
        || (prev_char == '/' && matches!(next_char, '/' | '*'))
    {
        out.push(' ');
        return;
    }

    // `1 .toString()` must not become `1.toString()`.
    if prev_char.is_ascii_digit() && next_char == '.' {
        out.push(' ');
        return;
    }

    if is_word_char(prev_char) && is_word_char(next_char) {
        out.push(' ');
    }
}

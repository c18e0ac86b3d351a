// File: src/errors.rs
//
// Host-side diagnostics: a structured error type used by the lexer,
// parser, compiler, and the CLI driver's top-level error reporting.
// Runtime-thrown language values (`throw E`) are NOT represented here;
// they travel as `Value`s through the VM's handler stack (see vm.rs).

use colored::Colorize;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub file: Option<String>,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        SourceLocation { line, column, file: None }
    }

    pub fn unknown() -> Self {
        SourceLocation::default()
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ParseError,
    CompileError,
    RuntimeError,
    TypeError,
    NameError,
    BoundsError,
    ArityError,
    Overflow,
    SerializerError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ParseError => "Parse Error",
            ErrorKind::CompileError => "Compile Error",
            ErrorKind::RuntimeError => "Runtime Error",
            ErrorKind::TypeError => "Type Error",
            ErrorKind::NameError => "Name Error",
            ErrorKind::BoundsError => "Bounds Error",
            ErrorKind::ArityError => "Arity Error",
            ErrorKind::Overflow => "Overflow",
            ErrorKind::SerializerError => "Serializer Error",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub struct IziError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub source_line: Option<String>,
    pub help: Option<String>,
    pub note: Option<String>,
    pub suggestion: Option<String>,
}

impl IziError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        IziError {
            kind,
            message: message.into(),
            location: None,
            source_line: None,
            help: None,
            note: None,
            suggestion: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_source(mut self, line: impl Into<String>) -> Self {
        self.source_line = Some(line.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        IziError::new(ErrorKind::RuntimeError, message)
    }

    pub fn compile(message: impl Into<String>) -> Self {
        IziError::new(ErrorKind::CompileError, message)
    }

    pub fn name_error(name: &str, known: &[&str]) -> Self {
        let mut err = IziError::new(ErrorKind::NameError, format!("undefined variable '{}'", name));
        if let Some(close) = find_closest_match(name, known) {
            err = err.with_suggestion(format!("did you mean '{}'?", close));
        }
        err
    }
}

impl fmt::Display for IziError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.kind.to_string().red().bold(), self.message)?;
        if let Some(loc) = &self.location {
            writeln!(f, "  {} {}", "-->".bright_blue(), loc)?;
        }
        if let Some(src) = &self.source_line {
            writeln!(f, "  {}", src)?;
            if let Some(loc) = &self.location {
                writeln!(f, "  {}{}", " ".repeat(loc.column.saturating_sub(1)), "^".red())?;
            }
        }
        if let Some(suggestion) = &self.suggestion {
            writeln!(f, "  {} {}", "suggestion:".green(), suggestion)?;
        }
        if let Some(help) = &self.help {
            writeln!(f, "  {} {}", "help:".yellow(), help)?;
        }
        if let Some(note) = &self.note {
            writeln!(f, "  {} {}", "note:".cyan(), note)?;
        }
        Ok(())
    }
}

impl std::error::Error for IziError {}

/// Standard dynamic-programming edit distance, used to power
/// "did you mean?" suggestions for undefined-name diagnostics.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        dp[0][j] = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1).min(dp[i][j - 1] + 1).min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[a.len()][b.len()]
}

pub fn find_closest_match(target: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein_distance(target, c)))
        .filter(|(_, dist)| *dist <= 2)
        .min_by_key(|(_, dist)| *dist)
        .map(|(name, _)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_distance_of_equal_strings_is_zero() {
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
    }

    #[test]
    fn find_closest_match_suggests_near_miss() {
        let candidates = ["length", "push", "print"];
        assert_eq!(find_closest_match("lenght", &candidates), Some("length".to_string()));
        assert_eq!(find_closest_match("totally_unrelated_name", &candidates), None);
    }
}

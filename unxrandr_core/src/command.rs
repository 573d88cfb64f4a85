// src/command.rs
//! Command line produced by the serializer, and its shell rendering.

use std::borrow::Cow;
use std::fmt;

use crate::config::OutputFormat;
use crate::error::{LayoutError, Result};
use crate::serializer::UnsupportedFeatureLoss;

pub const SHELL_SHEBANG: &str = "#!/bin/sh";

/// One invocation of the output-control tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    losses: Vec<UnsupportedFeatureLoss>,
}

impl CommandLine {
    pub(crate) fn new(program: &str, args: Vec<String>, losses: Vec<UnsupportedFeatureLoss>) -> Self {
        Self {
            program: program.to_string(),
            args,
            losses,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Program name followed by every argument.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str))
    }

    /// Attributes that were left out because the target cannot express them.
    pub fn losses(&self) -> &[UnsupportedFeatureLoss] {
        &self.losses
    }

    pub fn is_bare(&self) -> bool {
        self.args.is_empty()
    }

    pub fn to_script(&self) -> String {
        format!("{}\n{}\n", SHELL_SHEBANG, self)
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Command => self.to_string(),
            OutputFormat::Script => self.to_script(),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&quote(token))?;
        }
        Ok(())
    }
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c)
}

/// POSIX shell quoting of a single token.
pub fn quote(token: &str) -> Cow<'_, str> {
    if !token.is_empty() && token.chars().all(is_shell_safe) {
        return Cow::Borrowed(token);
    }
    Cow::Owned(format!("'{}'", token.replace('\'', r#"'"'"'"#)))
}

/// Split one shell line into words. Handles the quoting [`quote`] produces,
/// double quotes and backslash escapes; no expansions.
pub fn split(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => word.push(c),
                        None => return Err(LayoutError::syntax("Unterminated single quote")),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => word.push(c),
                            Some(c) => {
                                word.push('\\');
                                word.push(c);
                            }
                            None => return Err(LayoutError::syntax("Unterminated double quote")),
                        },
                        Some(c) => word.push(c),
                        None => return Err(LayoutError::syntax("Unterminated double quote")),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => word.push(c),
                    None => return Err(LayoutError::syntax("Trailing backslash")),
                }
            }
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}

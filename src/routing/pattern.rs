//! Path template compilation.
//!
//! A template is a `/`-separated path made of literal text, named
//! parameters (`:name`, one segment) and wildcards (`*`, any remainder).
//! Each template compiles to one or two anchored, case-insensitive rules:
//! the template as written and, when its literal text contains hyphens, the
//! same template with hyphens removed (`add-gift` also answers `addgift`).
//! Rules are tried in that order; the first to match wins.

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::error::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(String),
    Wildcard,
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    names: Vec<String>,
    rules: Vec<Regex>,
}

impl PathPattern {
    /// Compile a template.
    pub fn compile(template: &str) -> Result<Self, RegistryError> {
        let trimmed = template.trim_matches('/');
        let tokens = tokenize(trimmed);

        let mut names: Vec<String> = Vec::new();
        for token in &tokens {
            if let Token::Param(name) = token {
                if names.contains(name) {
                    return Err(RegistryError::InvalidTemplate {
                        template: template.to_string(),
                        reason: format!("parameter ':{}' appears twice", name),
                    });
                }
                names.push(name.clone());
            }
        }

        let mut rules = vec![build_rule(template, &tokens)?];

        let has_hyphen = tokens
            .iter()
            .any(|t| matches!(t, Token::Literal(text) if text.contains('-')));
        if has_hyphen {
            let stripped: Vec<Token> = tokens
                .iter()
                .map(|t| match t {
                    Token::Literal(text) => Token::Literal(text.replace('-', "")),
                    other => other.clone(),
                })
                .collect();
            rules.push(build_rule(template, &stripped)?);
        }

        Ok(Self {
            template: template.to_string(),
            names,
            rules,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Parameter names in template order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.is_match(path))
    }

    /// Decoded parameter values in template order, or `None` if no rule matches.
    pub fn extract(&self, path: &str) -> Option<Vec<(String, String)>> {
        let caps = self.rules.iter().find_map(|rule| rule.captures(path))?;
        let values = self
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let raw = caps.get(i + 1).map(|m| m.as_str()).unwrap_or_default();
                let decoded = percent_decode_str(raw).decode_utf8_lossy().into_owned();
                (name.clone(), decoded)
            })
            .collect();
        Some(values)
    }
}

fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ':' if chars.peek().is_some_and(|n| is_ident_start(*n)) => {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                let mut name = String::new();
                while let Some(n) = chars.peek().copied() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Param(name));
            }
            '*' => {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Wildcard);
            }
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn build_rule(template: &str, tokens: &[Token]) -> Result<Regex, RegistryError> {
    let mut pattern = String::from("(?i)^/?");
    for token in tokens {
        match token {
            Token::Literal(text) => pattern.push_str(&regex::escape(text)),
            Token::Param(_) => pattern.push_str("([^/]+)"),
            Token::Wildcard => pattern.push_str(".*"),
        }
    }
    pattern.push_str("/?$");

    Regex::new(&pattern).map_err(|e| RegistryError::InvalidTemplate {
        template: template.to_string(),
        reason: e.to_string(),
    })
}

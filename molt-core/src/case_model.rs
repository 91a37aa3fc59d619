//! Case-style tokenizer and renderer, reused by the case-coercion rule
//! (`rules::CaseStyleRule`) to turn a file basename into tokens and render
//! those tokens back out in a different style.
//!
//! Deliberately has no notion of acronyms: a renaming tool operates on
//! whatever basename it is given, once, and doesn't need the identifier-wide
//! dictionary a source-aware search/replace tool would.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Style {
    Snake,
    Kebab,
    Camel,
    Pascal,
    ScreamingSnake,
    Title,
    Train,
    ScreamingTrain,
    Dot,
}

impl Style {
    pub fn all() -> Vec<Style> {
        vec![
            Style::Snake,
            Style::Kebab,
            Style::Camel,
            Style::Pascal,
            Style::ScreamingSnake,
            Style::Title,
            Style::Train,
            Style::ScreamingTrain,
            Style::Dot,
        ]
    }
}

impl std::str::FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', '-'], "") {
            s if s == "snake" => Ok(Style::Snake),
            s if s == "kebab" => Ok(Style::Kebab),
            s if s == "camel" => Ok(Style::Camel),
            s if s == "pascal" => Ok(Style::Pascal),
            s if s == "screamingsnake" => Ok(Style::ScreamingSnake),
            s if s == "title" => Ok(Style::Title),
            s if s == "train" => Ok(Style::Train),
            s if s == "screamingtrain" => Ok(Style::ScreamingTrain),
            s if s == "dot" => Ok(Style::Dot),
            other => Err(format!("unknown case style: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenModel {
    pub tokens: Vec<Token>,
}

impl TokenModel {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

/// Detect the case style of `s`, if it unambiguously matches one.
pub fn detect_style(s: &str) -> Option<Style> {
    if s.is_empty() {
        return None;
    }

    let has_underscore = s.contains('_');
    let has_hyphen = s.contains('-');
    let has_dot = s.contains('.') && !s.starts_with('.');
    let has_space = s.contains(' ');
    let has_upper = s.bytes().any(|b| b.is_ascii_uppercase());
    let has_lower = s.bytes().any(|b| b.is_ascii_lowercase());

    match (has_underscore, has_hyphen, has_dot, has_space, has_upper, has_lower) {
        (true, false, false, false, false, true) => Some(Style::Snake),
        (true, false, false, false, true, false) => Some(Style::ScreamingSnake),
        (false, true, false, false, false, true) => Some(Style::Kebab),
        (false, true, false, false, true, false) => Some(Style::ScreamingTrain),
        (false, true, false, false, true, true) => {
            is_title_words(s, '-').then_some(Style::Train)
        },
        (false, false, true, false, _, true) => Some(Style::Dot),
        (false, false, false, true, true, true) => {
            is_title_words(s, ' ').then_some(Style::Title)
        },
        (false, false, false, false, true, true) => {
            if s.bytes().next().is_some_and(|b| b.is_ascii_uppercase()) {
                Some(Style::Pascal)
            } else {
                Some(Style::Camel)
            }
        },
        _ => None,
    }
}

fn is_title_words(s: &str, sep: char) -> bool {
    s.split(sep).all(|word| {
        !word.is_empty()
            && word.bytes().next().is_some_and(|b| b.is_ascii_uppercase())
            && word.bytes().skip(1).all(|b| b.is_ascii_lowercase())
    })
}

/// Split `s` into tokens at delimiter characters and case/digit boundaries.
/// Alphanumeric runs that mix letters and trailing digits (`amd64`,
/// `project1`) stay as one token; a digit run followed by an uppercase
/// letter (`arm64Arch`) splits before the letter.
pub fn parse_to_tokens(s: &str) -> TokenModel {
    let mut tokens = Vec::new();
    let bytes = s.as_bytes();
    let mut current = Vec::new();

    for i in 0..bytes.len() {
        let b = bytes[i];

        if b == b'_' || b == b'-' || b == b'.' || b == b' ' {
            if !current.is_empty() {
                tokens.push(Token::new(std::str::from_utf8(&current).unwrap_or_default()));
                current.clear();
            }
            continue;
        }

        if !b.is_ascii_alphanumeric() {
            continue;
        }

        if i > 0 && !current.is_empty() {
            let prev = bytes[i - 1];
            let should_split = (prev.is_ascii_lowercase() && b.is_ascii_uppercase())
                || (prev.is_ascii_digit() && b.is_ascii_uppercase());
            if should_split {
                tokens.push(Token::new(std::str::from_utf8(&current).unwrap_or_default()));
                current.clear();
            }
        }

        current.push(b);
    }

    if !current.is_empty() {
        tokens.push(Token::new(std::str::from_utf8(&current).unwrap_or_default()));
    }

    TokenModel::new(tokens)
}

pub fn to_style(model: &TokenModel, style: Style) -> String {
    if model.tokens.is_empty() {
        return String::new();
    }

    match style {
        Style::Snake => join_lower(model, "_"),
        Style::Kebab => join_lower(model, "-"),
        Style::ScreamingSnake => join_upper(model, "_"),
        Style::ScreamingTrain => join_upper(model, "-"),
        Style::Dot => join_lower(model, "."),
        Style::Title => model
            .tokens
            .iter()
            .map(|t| capitalize_first(&t.text))
            .collect::<Vec<_>>()
            .join(" "),
        Style::Train => model
            .tokens
            .iter()
            .map(|t| capitalize_first(&t.text))
            .collect::<Vec<_>>()
            .join("-"),
        Style::Camel => {
            let mut result = String::new();
            for (i, token) in model.tokens.iter().enumerate() {
                if i == 0 {
                    result.push_str(&token.text.to_lowercase());
                } else {
                    result.push_str(&capitalize_first(&token.text));
                }
            }
            result
        },
        Style::Pascal => model.tokens.iter().map(|t| capitalize_first(&t.text)).collect(),
    }
}

fn join_lower(model: &TokenModel, sep: &str) -> String {
    model.tokens.iter().map(|t| t.text.to_lowercase()).collect::<Vec<_>>().join(sep)
}

fn join_upper(model: &TokenModel, sep: &str) -> String {
    model.tokens.iter().map(|t| t.text.to_uppercase()).collect::<Vec<_>>().join(sep)
}

fn capitalize_first(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

/// Re-render `basename` in `style`, preserving its token boundaries.
pub fn coerce(basename: &str, style: Style) -> String {
    to_style(&parse_to_tokens(basename), style)
}

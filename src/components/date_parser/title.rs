use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;

/// Title used when the text around a date expression carries no words
pub const PLACEHOLDER_TITLE: &str = "Event from image";

lazy_static! {
    static ref LEADING_CONNECTIVE: Regex =
        Regex::new(r"(?i)^(?:on|at|for|in)(?:\s+|$)").expect("connective pattern");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("whitespace pattern");
}

const EDGE_SEPARATORS: &[char] = &[',', ';', ':', '-', '–', '—', '|'];

/// Ways of deriving a title from the text around a matched expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleStrategy {
    /// Text preceding the expression
    BeforeMatch,
    /// Text following the expression
    AfterMatch,
    /// Fixed placeholder
    Placeholder,
}

/// Strategies in the order they are tried
pub const TITLE_STRATEGIES: [TitleStrategy; 3] = [
    TitleStrategy::BeforeMatch,
    TitleStrategy::AfterMatch,
    TitleStrategy::Placeholder,
];

impl TitleStrategy {
    /// Title produced by this strategy, `None` when it yields nothing
    pub fn apply(self, text: &str, span: &Range<usize>) -> Option<String> {
        let candidate = match self {
            TitleStrategy::BeforeMatch => normalize_title(&text[..span.start]),
            TitleStrategy::AfterMatch => normalize_title(&text[span.end..]),
            TitleStrategy::Placeholder => normalize_title(PLACEHOLDER_TITLE),
        };
        (!candidate.is_empty()).then_some(candidate)
    }
}

/// First non-empty title from the ordered strategies
pub fn derive_title(text: &str, span: &Range<usize>) -> String {
    TITLE_STRATEGIES
        .iter()
        .find_map(|strategy| strategy.apply(text, span))
        .unwrap_or_else(|| normalize_title(PLACEHOLDER_TITLE))
}

/// Normalize a title fragment.
///
/// Strips edge separators and one leading connective, collapses whitespace,
/// then capitalizes the first character and lower-cases the rest.
pub fn normalize_title(fragment: &str) -> String {
    let trimmed = trim_edges(fragment);
    let stripped = LEADING_CONNECTIVE.replace(trimmed, "");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let cleaned = trim_edges(&collapsed);

    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn trim_edges(fragment: &str) -> &str {
    fragment.trim_matches(|c: char| c.is_whitespace() || EDGE_SEPARATORS.contains(&c))
}

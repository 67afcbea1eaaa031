//! Natural-language date parsing.
//!
//! Finds the first date/time expression in a fragment of recognized text,
//! resolves it against a reference instant and derives a title from the
//! words around it.

pub mod expression;
pub mod resolve;
pub mod title;

use crate::error::{AppResult, Error};
use chrono::DateTime;
use chrono_tz::Tz;
use tracing::debug;

pub use expression::{find_expression, DateSpec, Expression, TimeSpec};
pub use resolve::{resolve, DEFAULT_EVENT_MINUTES};
pub use title::{derive_title, normalize_title, TitleStrategy, PLACEHOLDER_TITLE, TITLE_STRATEGIES};

/// Event extracted from a text fragment
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvent {
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    /// The full text the event was parsed from
    pub description: String,
}

/// Parse `text` into an event relative to `reference`
pub fn parse(text: &str, reference: &DateTime<Tz>) -> AppResult<ParsedEvent> {
    let expression = find_expression(text).ok_or_else(|| Error::NoDateFound(text.to_string()))?;
    let (start, end) = resolve(&expression, reference)?;
    let title = derive_title(text, &expression.span);

    debug!(
        "Parsed '{}' as '{}' from {} to {}",
        text, title, start, end
    );

    Ok(ParsedEvent {
        title,
        start,
        end,
        description: text.to_string(),
    })
}

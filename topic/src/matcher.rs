//! Single filter/topic matching.
//!
//! Walks both strings level by level. `+` consumes exactly one topic level,
//! a trailing `#` consumes the rest including zero levels, so `sport/#`
//! matches `sport` while `sport/+` does not.

use std::str::Split;

use crate::error::{InvalidTopic, Result};
use crate::validate::is_system;

/// Returns whether `topic` matches `filter`.
///
/// Both inputs are expected to have passed validation. A topic containing a
/// wildcard, an empty input or a malformed wildcard level in the filter is
/// reported as an error rather than a non-match.
///
/// A `$`-prefixed topic never matches a filter that does not also start with
/// `$`, and vice versa.
pub fn matches(filter: &str, topic: &str) -> Result<bool> {
    if filter.is_empty() || topic.is_empty() {
        return Err(InvalidTopic::Empty.into());
    }
    if let Some(offset) = topic.bytes().position(|b| b == b'+' || b == b'#') {
        return Err(InvalidTopic::WildcardInName { offset }.into());
    }
    if is_system(filter) != is_system(topic) {
        return Ok(false);
    }

    let mut filter_levels = Levels::new(filter);
    let mut topic_levels = topic.split('/');
    loop {
        match (filter_levels.next()?, topic_levels.next()) {
            // Zero or more remaining levels.
            (Some("#"), _) => return Ok(true),
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (Some(_), _) => {
                filter_levels.check_rest()?;
                return Ok(false);
            }
            (None, None) => return Ok(true),
            (None, Some(_)) => return Ok(false),
        }
    }
}

/// Filter levels with wildcard placement checked as they are produced.
struct Levels<'a> {
    src: &'a str,
    inner: Split<'a, char>,
    offset: usize,
}

impl<'a> Levels<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            inner: src.split('/'),
            offset: 0,
        }
    }

    fn next(&mut self) -> Result<Option<&'a str>> {
        let Some(level) = self.inner.next() else {
            return Ok(None);
        };
        let start = self.offset;
        self.offset += level.len() + 1;

        match level {
            "+" => Ok(Some(level)),
            "#" if self.offset > self.src.len() => Ok(Some(level)),
            "#" => Err(InvalidTopic::MisplacedMultiLevel { offset: start }.into()),
            _ => match level.bytes().position(|b| b == b'+' || b == b'#') {
                Some(pos) if level.as_bytes()[pos] == b'+' => {
                    Err(InvalidTopic::MisplacedSingleLevel { offset: start + pos }.into())
                }
                Some(pos) => Err(InvalidTopic::MisplacedMultiLevel { offset: start + pos }.into()),
                None => Ok(Some(level)),
            },
        }
    }

    /// Scan the unmatched remainder so a malformed filter is still reported.
    fn check_rest(&mut self) -> Result<()> {
        while self.next()?.is_some() {}
        Ok(())
    }
}

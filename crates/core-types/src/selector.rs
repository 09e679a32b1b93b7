//! Element selectors and the retry tuning shared by every selector of a task.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration;
use crate::error::TokenError;

/// Strategy used to locate an element.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SelectorBy {
    /// Let the backend try CSS, XPath and id lookups in turn.
    #[default]
    Search,
    /// A JavaScript expression evaluating to the element.
    JsPath,
    /// Element id attribute.
    Id,
    /// First CSS match.
    Query,
    /// Every CSS match.
    QueryAll,
}

impl SelectorBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorBy::Search => "search",
            SelectorBy::JsPath => "js_path",
            SelectorBy::Id => "id",
            SelectorBy::Query => "query",
            SelectorBy::QueryAll => "query_all",
        }
    }
}

impl FromStr for SelectorBy {
    type Err = TokenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize_token(raw).as_str() {
            "search" => Ok(SelectorBy::Search),
            "js_path" => Ok(SelectorBy::JsPath),
            "id" => Ok(SelectorBy::Id),
            "query" => Ok(SelectorBy::Query),
            "query_all" => Ok(SelectorBy::QueryAll),
            _ => Err(TokenError::new("by", raw)),
        }
    }
}

impl TryFrom<String> for SelectorBy {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SelectorBy> for String {
    fn from(value: SelectorBy) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SelectorBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition an element must satisfy before the query succeeds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SelectorOn {
    Ready,
    Visible,
    NotVisible,
    Enabled,
    Selected,
    NotPresent,
}

impl SelectorOn {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorOn::Ready => "ready",
            SelectorOn::Visible => "visible",
            SelectorOn::NotVisible => "not_visible",
            SelectorOn::Enabled => "enabled",
            SelectorOn::Selected => "selected",
            SelectorOn::NotPresent => "not_present",
        }
    }
}

impl FromStr for SelectorOn {
    type Err = TokenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize_token(raw).as_str() {
            "ready" => Ok(SelectorOn::Ready),
            "visible" => Ok(SelectorOn::Visible),
            "not_visible" => Ok(SelectorOn::NotVisible),
            "enabled" => Ok(SelectorOn::Enabled),
            "selected" => Ok(SelectorOn::Selected),
            "not_present" => Ok(SelectorOn::NotPresent),
            _ => Err(TokenError::new("on", raw)),
        }
    }
}

impl TryFrom<String> for SelectorOn {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SelectorOn> for String {
    fn from(value: SelectorOn) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SelectorOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Accepts `js_path`, `js-path` and `JS_PATH` alike.
fn normalize_token(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace('-', "_")
}

/// Declarative element lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Selector {
    pub target: String,
    #[serde(default)]
    pub by: SelectorBy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<SelectorOn>,
}

impl Selector {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            by: SelectorBy::Search,
            on: None,
        }
    }

    pub fn with_by(mut self, by: SelectorBy) -> Self {
        self.by = by;
        self
    }

    pub fn with_on(mut self, on: SelectorOn) -> Self {
        self.on = Some(on);
        self
    }
}

/// Retry tuning applied to every selector of one task.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
    /// Interval between query attempts; backend default when absent.
    #[serde(
        default,
        with = "duration::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub retry_interval: Option<Duration>,
    /// Minimum number of matching nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_least: Option<u32>,
}

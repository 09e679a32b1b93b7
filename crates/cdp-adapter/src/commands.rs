//! Command parameter types exposed by the backend interface.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use soulscript_core_types::{SelectorBy, SelectorOn};

/// A concrete element query, one per resolved selector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub target: String,
    pub by: SelectorBy,
    /// Wait condition; the action's default applies when absent.
    pub on: Option<SelectorOn>,
    pub retry_interval: Option<Duration>,
    pub at_least: Option<u32>,
}

impl QuerySpec {
    pub fn new(target: impl Into<String>, by: SelectorBy) -> Self {
        Self {
            target: target.into(),
            by,
            on: None,
            retry_interval: None,
            at_least: None,
        }
    }

    /// Condition to poll for when running `action`.
    pub fn effective_condition(&self, action: QueryAction) -> SelectorOn {
        self.on.unwrap_or_else(|| action.default_condition())
    }

    pub fn min_matches(&self) -> u32 {
        self.at_least.unwrap_or(1).max(1)
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (by={}", self.target, self.by)?;
        if let Some(on) = self.on {
            write!(f, ", on={on}")?;
        }
        if let Some(at_least) = self.at_least {
            write!(f, ", at_least={at_least}")?;
        }
        if let Some(interval) = self.retry_interval {
            write!(f, ", retry_interval={}", humantime::format_duration(interval))?;
        }
        f.write_str(")")
    }
}

/// What to do with the element once its query is satisfied.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryAction {
    Click,
    DoubleClick,
    Blur,
    Clear,
    WaitVisible,
    Screenshot,
}

impl QueryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryAction::Click => "click",
            QueryAction::DoubleClick => "double_click",
            QueryAction::Blur => "blur",
            QueryAction::Clear => "clear",
            QueryAction::WaitVisible => "wait_visible",
            QueryAction::Screenshot => "screenshot",
        }
    }

    pub fn default_condition(&self) -> SelectorOn {
        match self {
            QueryAction::Blur => SelectorOn::Ready,
            QueryAction::Click
            | QueryAction::DoubleClick
            | QueryAction::Clear
            | QueryAction::WaitVisible
            | QueryAction::Screenshot => SelectorOn::Visible,
        }
    }

    /// Whether the action needs the element scrolled into view and measured.
    pub fn needs_geometry(&self) -> bool {
        matches!(
            self,
            QueryAction::Click | QueryAction::DoubleClick | QueryAction::Screenshot
        )
    }
}

impl fmt::Display for QueryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounding box of the first matched node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    /// Viewport-relative, used for input events.
    pub x: f64,
    pub y: f64,
    /// Document-relative, used for screenshot clips.
    pub page_x: f64,
    pub page_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementRect {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Outcome of one evaluation of the query script.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryProbe {
    pub ready: bool,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub rect: Option<ElementRect>,
}

/// Browser build information.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowserVersion {
    pub product: String,
    pub protocol_version: String,
    pub revision: String,
    pub user_agent: String,
    pub js_version: String,
}

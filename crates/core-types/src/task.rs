//! The closed set of automation steps.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration;
use crate::expression::Expression;
use crate::selector::{Options, Selector};

/// Default file name for screenshots that do not name their output.
pub const DEFAULT_SCREENSHOT_NAME: &str = "screenshot.png";

/// One declarative automation step.
///
/// Decoded from a single-key map such as `navigate: { url: ... }`;
/// parameterless steps may also be written as a bare string (`- reload`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Navigate(Navigate),
    NavigateForward,
    NavigateBack,
    Reload,
    Stop,
    Sleep(Sleep),
    Eval(Eval),
    Title(Title),
    Click(ElementTask),
    DoubleClick(ElementTask),
    Blur(ElementTask),
    Clear(ElementTask),
    WaitVisible(ElementTask),
    Screenshot(Screenshot),
    /// Report browser version information.
    Version,
}

impl Task {
    /// Configuration keyword of this task kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Task::Navigate(_) => "navigate",
            Task::NavigateForward => "navigate_forward",
            Task::NavigateBack => "navigate_back",
            Task::Reload => "reload",
            Task::Stop => "stop",
            Task::Sleep(_) => "sleep",
            Task::Eval(_) => "eval",
            Task::Title(_) => "title",
            Task::Click(_) => "click",
            Task::DoubleClick(_) => "double_click",
            Task::Blur(_) => "blur",
            Task::Clear(_) => "clear",
            Task::WaitVisible(_) => "wait_visible",
            Task::Screenshot(_) => "screenshot",
            Task::Version => "version",
        }
    }

    pub fn navigate(url: Expression) -> Self {
        Task::Navigate(Navigate { url })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Navigate {
    /// Evaluated when the step runs, not when it is decoded.
    pub url: Expression,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sleep {
    #[serde(with = "duration")]
    pub duration: Duration,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Eval {
    /// Output and variable name the result is bound to.
    pub name: String,
    pub script: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Title {
    pub name: String,
}

/// Shared shape of every element-targeting step.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementTask {
    /// Plain selector, queried with the search strategy after `selectors`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub selector: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selectors: Vec<Selector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

impl ElementTask {
    pub fn plain(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            ..Self::default()
        }
    }

    pub fn structured(selectors: Vec<Selector>) -> Self {
        Self {
            selectors,
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Screenshot {
    /// Output file name; [`DEFAULT_SCREENSHOT_NAME`] when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub selector: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selectors: Vec<Selector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
    /// Device scale factor for element captures; values `<= 0` mean unscaled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl Screenshot {
    pub fn file_name(&self) -> &str {
        if self.name.is_empty() {
            DEFAULT_SCREENSHOT_NAME
        } else {
            &self.name
        }
    }

    pub fn has_selectors(&self) -> bool {
        !self.selector.is_empty() || !self.selectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{SelectorBy, SelectorOn};

    #[test]
    fn decodes_map_and_bare_forms() {
        let tasks: Vec<Task> = serde_yaml::from_str(
            r#"
- navigate: { url: "https://example.com" }
- reload
- navigate_back
- sleep: { duration: 1s }
"#,
        )
        .unwrap();
        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks[1], Task::Reload);
        assert_eq!(tasks[2], Task::NavigateBack);
        assert_eq!(
            tasks[3],
            Task::Sleep(Sleep {
                duration: Duration::from_secs(1)
            })
        );
    }

    #[test]
    fn decodes_element_task_with_everything() {
        let task: Task = serde_yaml::from_str(
            r##"
click:
  selector: "#a"
  selectors:
    - { target: "//button", by: search, on: visible }
    - { target: "b", by: query_all }
  options: { retry_interval: 1s, at_least: 2 }
"##,
        )
        .unwrap();
        let Task::Click(click) = task else {
            panic!("expected click");
        };
        assert_eq!(click.selector, "#a");
        assert_eq!(click.selectors[0].on, Some(SelectorOn::Visible));
        assert_eq!(click.selectors[1].by, SelectorBy::QueryAll);
        assert_eq!(click.options.unwrap().at_least, Some(2));
    }

    #[test]
    fn rejects_unknown_task_kinds_and_fields() {
        assert!(serde_yaml::from_str::<Task>("hover: { selector: a }").is_err());
        assert!(serde_yaml::from_str::<Task>("title: { name: t, extra: 1 }").is_err());
    }

    #[test]
    fn rejects_malformed_navigate_template() {
        assert!(serde_yaml::from_str::<Task>("navigate: { url: 'x/${broken' }").is_err());
    }

    #[test]
    fn screenshot_defaults_file_name() {
        let shot = Screenshot::default();
        assert_eq!(shot.file_name(), DEFAULT_SCREENSHOT_NAME);
        assert!(!shot.has_selectors());
    }

    #[test]
    fn decodes_json_tasks() {
        let task: Task = serde_json::from_str(r#"{"eval": {"name": "x", "script": "1+1"}}"#).unwrap();
        assert_eq!(task.kind(), "eval");
        let task: Task = serde_json::from_str(r#""stop""#).unwrap();
        assert_eq!(task, Task::Stop);
    }
}

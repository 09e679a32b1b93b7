//! Command-line automation expressions
//!
//! `run` takes sources (automation files or URLs) followed by steps, each
//! step introduced by a token starting with `-`:
//!
//! ```text
//! soulscript run https://example.com -eval 'document.title' -screenshot file=a.png,scale=2
//! ```

use std::path::PathBuf;
use std::time::Duration;

use soulscript_core_types::{
    ElementTask, Eval, Expression, Options, Screenshot, Selector, SelectorBy, SelectorOn, Sleep,
    Task, Title,
};
use thiserror::Error;

const URL_PREFIXES: &[&str] = &["http://", "https://", "about:", "chrome:", "file://"];

/// Output name of the `-title` step.
pub const TITLE_OUTPUT: &str = "title";

#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    Url(Expression),
    File(PathBuf),
    Stdin,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Task(Task),
    /// `-eval @FILE`: script text read from a file before the run.
    EvalFile { name: String, path: PathBuf },
    /// `-run FILE`: every automation in the file.
    RunFile(PathBuf),
    /// `-flow NAME`: a named automation from the workspace.
    Flow(String),
}

/// Parsed `run` arguments, in command-line order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Invocation {
    pub sources: Vec<Source>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ExprError {
    #[error("unknown step -{0}")]
    UnknownStep(String),

    #[error("-{step} expects {expected}")]
    MissingArgument {
        step: &'static str,
        expected: &'static str,
    },

    #[error("unexpected argument {0:?}; steps start with '-'")]
    UnexpectedArgument(String),

    #[error("-{step}: invalid {what} {value:?}: {reason}")]
    InvalidArgument {
        step: &'static str,
        what: &'static str,
        value: String,
        reason: String,
    },
}

fn is_step_token(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

fn looks_like_url(source: &str) -> bool {
    URL_PREFIXES.iter().any(|prefix| source.starts_with(prefix))
}

/// Split `args` into sources and steps and parse each step.
pub fn parse_invocation(args: &[String]) -> Result<Invocation, ExprError> {
    let split = args
        .iter()
        .position(|token| is_step_token(token))
        .unwrap_or(args.len());

    let mut invocation = Invocation::default();
    for source in &args[..split] {
        match source.as_str() {
            "." => continue,
            "-" => invocation.sources.push(Source::Stdin),
            url if looks_like_url(url) => {
                invocation.sources.push(Source::Url(parse_url("navigate", url)?));
            }
            path => invocation.sources.push(Source::File(PathBuf::from(path))),
        }
    }

    let mut parser = StepParser {
        tokens: &args[split..],
        pos: 0,
        evals: 0,
    };
    while let Some(step) = parser.next_step()? {
        invocation.steps.push(step);
    }
    Ok(invocation)
}

struct StepParser<'a> {
    tokens: &'a [String],
    pos: usize,
    evals: usize,
}

impl<'a> StepParser<'a> {
    fn next_token(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token.as_str())
    }

    fn argument(&mut self, step: &'static str, expected: &'static str) -> Result<&'a str, ExprError> {
        self.next_token()
            .ok_or(ExprError::MissingArgument { step, expected })
    }

    fn optional_argument(&mut self) -> Option<&'a str> {
        match self.tokens.get(self.pos) {
            Some(token) if !token.starts_with('-') => self.next_token(),
            _ => None,
        }
    }

    fn next_step(&mut self) -> Result<Option<Step>, ExprError> {
        let Some(token) = self.next_token() else {
            return Ok(None);
        };
        if !is_step_token(token) {
            return Err(ExprError::UnexpectedArgument(token.to_string()));
        }

        let name = token.trim_start_matches('-').replace('_', "-");
        let task = match name.as_str() {
            "navigate" => {
                let url = self.argument("navigate", "a URL")?;
                Task::navigate(parse_url("navigate", url)?)
            }
            "eval" => {
                let script = self.argument("eval", "a script or @FILE")?;
                self.evals += 1;
                let name = format!("_{}", self.evals);
                if let Some(path) = script.strip_prefix('@') {
                    return Ok(Some(Step::EvalFile {
                        name,
                        path: PathBuf::from(path),
                    }));
                }
                Task::Eval(Eval {
                    name,
                    script: script.to_string(),
                })
            }
            "title" => Task::Title(Title {
                name: TITLE_OUTPUT.to_string(),
            }),
            "screenshot" => {
                let options = self.optional_argument().unwrap_or_default();
                Task::Screenshot(parse_screenshot(options)?)
            }
            "sleep" => {
                let raw = self.argument("sleep", "a duration")?;
                Task::Sleep(Sleep {
                    duration: parse_duration("sleep", raw)?,
                })
            }
            "forward" => Task::NavigateForward,
            "back" => Task::NavigateBack,
            "reload" => Task::Reload,
            "stop" => Task::Stop,
            "click" => Task::Click(ElementTask::plain(self.argument("click", "a selector")?)),
            "double-click" => Task::DoubleClick(ElementTask::plain(
                self.argument("double-click", "a selector")?,
            )),
            "blur" => Task::Blur(ElementTask::plain(self.argument("blur", "a selector")?)),
            "clear" => Task::Clear(ElementTask::plain(self.argument("clear", "a selector")?)),
            "wait-visible" => Task::WaitVisible(ElementTask::plain(
                self.argument("wait-visible", "a selector")?,
            )),
            "version" => Task::Version,
            "run" => {
                let path = self.argument("run", "a file")?;
                return Ok(Some(Step::RunFile(PathBuf::from(path))));
            }
            "flow" => {
                let name = self.argument("flow", "an automation name")?;
                return Ok(Some(Step::Flow(name.to_string())));
            }
            _ => return Err(ExprError::UnknownStep(name.clone())),
        };
        Ok(Some(Step::Task(task)))
    }
}

fn parse_url(step: &'static str, raw: &str) -> Result<Expression, ExprError> {
    Expression::parse(raw).map_err(|err| ExprError::InvalidArgument {
        step,
        what: "URL",
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

fn parse_duration(step: &'static str, raw: &str) -> Result<Duration, ExprError> {
    humantime::parse_duration(raw.trim()).map_err(|err| ExprError::InvalidArgument {
        step,
        what: "duration",
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

/// Parse `key=value[,key=value...]` screenshot options.
pub fn parse_screenshot(raw: &str) -> Result<Screenshot, ExprError> {
    const STEP: &str = "screenshot";
    let invalid = |what: &'static str, value: &str, reason: String| ExprError::InvalidArgument {
        step: STEP,
        what,
        value: value.to_string(),
        reason,
    };

    let mut shot = Screenshot::default();
    let mut target: Option<String> = None;
    let mut by: Option<SelectorBy> = None;
    let mut on: Option<SelectorOn> = None;
    let mut options = Options::default();

    for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| invalid("option", pair, "expected key=value".to_string()))?;
        let value = value.trim();
        match key.trim() {
            "file" => shot.name = value.to_string(),
            "scale" => {
                let scale = value
                    .parse::<f64>()
                    .map_err(|err| invalid("scale", value, err.to_string()))?;
                shot.scale = Some(scale);
            }
            "selector" => target = Some(value.to_string()),
            "by" => by = Some(value.parse().map_err(|err| invalid("by", value, format!("{err}")))?),
            "on" => on = Some(value.parse().map_err(|err| invalid("on", value, format!("{err}")))?),
            "retry_interval" => options.retry_interval = Some(parse_duration(STEP, value)?),
            "at_least" => {
                let at_least = value
                    .parse::<u32>()
                    .map_err(|err| invalid("at_least", value, err.to_string()))?;
                options.at_least = Some(at_least);
            }
            other => return Err(invalid("option", other, "unknown key".to_string())),
        }
    }

    match target {
        Some(target) => {
            let mut selector = Selector::new(target).with_by(by.unwrap_or_default());
            selector.on = on;
            shot.selectors.push(selector);
        }
        None if by.is_some() || on.is_some() => {
            return Err(invalid("option", raw, "by/on require selector".to_string()));
        }
        None => {}
    }
    if options != Options::default() {
        shot.options = Some(options);
    }
    Ok(shot)
}

//! Task compiler: binds declarative tasks to executable actions

use std::fmt;
use std::time::Duration;

use action_locator::{describe, resolve_element_task, resolve_screenshot};
use cdp_adapter::{AdapterError, QueryAction, QuerySpec, Session};
use serde_json::Value;
use soulscript_core_types::{Expression, Task};
use tracing::{info, warn};

use crate::context::{decode_string_map, EvalContext};
use crate::errors::FlowError;
use crate::result::RunResult;

/// Output name the `version` step records under.
pub const VERSION_OUTPUT: &str = "version";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HistoryStep {
    Forward,
    Back,
    Reload,
    Stop,
}

impl HistoryStep {
    fn label(self) -> &'static str {
        match self {
            HistoryStep::Forward => "Navigate forward",
            HistoryStep::Back => "Navigate back",
            HistoryStep::Reload => "Reload",
            HistoryStep::Stop => "Stop",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Step {
    Navigate(Expression),
    History(HistoryStep),
    Sleep(Duration),
    Eval {
        name: String,
        script: String,
    },
    Title {
        name: String,
    },
    Query {
        action: QueryAction,
        queries: Vec<QuerySpec>,
    },
    Screenshot {
        file: String,
        queries: Vec<QuerySpec>,
        scale: Option<f64>,
    },
    Version,
}

/// Executable form of one task.
///
/// Holds no run state; the evaluation context and result are passed to
/// [`Action::execute`] explicitly, so one action can run any number of times.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    kind: &'static str,
    step: Step,
}

/// Compile a task. Performs no I/O.
pub fn bind(task: &Task) -> Action {
    let step = match task {
        Task::Navigate(navigate) => Step::Navigate(navigate.url.clone()),
        Task::NavigateForward => Step::History(HistoryStep::Forward),
        Task::NavigateBack => Step::History(HistoryStep::Back),
        Task::Reload => Step::History(HistoryStep::Reload),
        Task::Stop => Step::History(HistoryStep::Stop),
        Task::Sleep(sleep) => Step::Sleep(sleep.duration),
        Task::Eval(eval) => Step::Eval {
            name: eval.name.clone(),
            script: eval.script.clone(),
        },
        Task::Title(title) => Step::Title {
            name: title.name.clone(),
        },
        Task::Click(target) => query_step(QueryAction::Click, resolve_element_task(target)),
        Task::DoubleClick(target) => {
            query_step(QueryAction::DoubleClick, resolve_element_task(target))
        }
        Task::Blur(target) => query_step(QueryAction::Blur, resolve_element_task(target)),
        Task::Clear(target) => query_step(QueryAction::Clear, resolve_element_task(target)),
        Task::WaitVisible(target) => {
            query_step(QueryAction::WaitVisible, resolve_element_task(target))
        }
        Task::Screenshot(shot) => Step::Screenshot {
            file: shot.file_name().to_string(),
            queries: resolve_screenshot(shot),
            scale: shot.scale,
        },
        Task::Version => Step::Version,
    };

    Action {
        kind: task.kind(),
        step,
    }
}

fn query_step(action: QueryAction, queries: Vec<QuerySpec>) -> Step {
    Step::Query { action, queries }
}

impl Action {
    /// Task keyword this action was bound from.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Element queries this action will issue, in order.
    pub fn queries(&self) -> &[QuerySpec] {
        match &self.step {
            Step::Query { queries, .. } | Step::Screenshot { queries, .. } => queries,
            _ => &[],
        }
    }

    /// Run against `session`, reading and writing the run state.
    pub async fn execute(
        &self,
        session: &dyn Session,
        ctx: &mut EvalContext,
        result: &mut RunResult,
    ) -> Result<(), FlowError> {
        match &self.step {
            Step::Navigate(url) => {
                // Lenient: a URL that does not evaluate turns the step into a no-op.
                let target = match url.evaluate_string(&*ctx) {
                    Ok(target) => target,
                    Err(err) => {
                        warn!(url = %url, error = %err, "Skipping navigation; URL did not evaluate");
                        return Ok(());
                    }
                };
                session
                    .navigate(&target)
                    .await
                    .map_err(|err| self.failed(err))?;
                info!("Navigate to `{}'", target);
            }

            Step::History(step) => {
                let outcome = match step {
                    HistoryStep::Forward => session.navigate_forward().await,
                    HistoryStep::Back => session.navigate_back().await,
                    HistoryStep::Reload => session.reload().await,
                    HistoryStep::Stop => session.stop().await,
                };
                outcome.map_err(|err| self.failed(err))?;
                info!("{}", step.label());
            }

            Step::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                info!("Sleep {}", humantime::format_duration(*duration));
            }

            Step::Eval { name, script } => {
                let raw = session
                    .evaluate(script)
                    .await
                    .map_err(|err| self.failed(err))?;
                ctx.set(name.clone(), decode_string_map(&raw));
                result.set_output(name.clone(), raw);
                info!("Evaluate script `{}'", name);
            }

            Step::Title { name } => {
                let title = session.title().await.map_err(|err| self.failed(err))?;
                result.set_output(name.clone(), Value::String(title.clone()));
                ctx.set(name.clone(), Value::String(title));
                info!("Extract title into variable `{}'", name);
            }

            Step::Query { action, queries } => {
                for query in queries {
                    session
                        .query_action(*action, query)
                        .await
                        .map_err(|err| self.failed(err))?;
                }
                info!("{} {}", action, describe(queries));
            }

            Step::Screenshot {
                file,
                queries,
                scale,
            } => {
                result.register_file(file.clone());
                if queries.is_empty() {
                    let bytes = session
                        .capture_screenshot()
                        .await
                        .map_err(|err| self.failed(err))?;
                    result.write_file(file.clone(), bytes);
                } else {
                    let scale = (*scale).filter(|value| *value > 0.0);
                    for query in queries {
                        let bytes = session
                            .element_screenshot(query, scale)
                            .await
                            .map_err(|err| self.failed(err))?;
                        result.write_file(file.clone(), bytes);
                    }
                }
                info!(file = %file, "Captured screenshot");
            }

            Step::Version => {
                let version = session.version().await.map_err(|err| self.failed(err))?;
                info!(
                    product = %version.product,
                    protocol = %version.protocol_version,
                    revision = %version.revision,
                    js = %version.js_version,
                    "Browser version"
                );
                result.set_output(VERSION_OUTPUT, serde_json::to_value(&version)?);
            }
        }
        Ok(())
    }

    fn failed(&self, source: AdapterError) -> FlowError {
        FlowError::StepFailed {
            step: self.to_string(),
            source,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.step {
            Step::Navigate(url) => write!(f, "navigate {url}"),
            Step::Sleep(duration) => write!(f, "sleep {duration:?}"),
            Step::Eval { name, .. } | Step::Title { name } => write!(f, "{} {name}", self.kind),
            Step::Query { queries, .. } => write!(f, "{} {}", self.kind, describe(queries)),
            Step::Screenshot { file, .. } => write!(f, "screenshot {file}"),
            Step::History(_) | Step::Version => f.write_str(self.kind),
        }
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use action_flow::{bind, execute, Allocator, Automation};
use anyhow::{bail, Context, Result};
use clap::Args;
use soulscript_core_types::{AutomationFile, Eval, FileFormat, Task};
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::context::CliContext;
use super::expr::{parse_invocation, Invocation, Source, Step};
use super::output::{persist_files, print_outputs};
use crate::workspace::read_automation_file;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Attach to a running browser (ws:// or http://host:port) instead of launching one
    #[arg(short, long, value_name = "URL")]
    pub browser: Option<String>,

    /// Device emulation id (see `soulscript devices`)
    #[arg(short = 'D', long, value_name = "ID")]
    pub device: Option<String>,

    /// Directory output files are written to
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Cancel the whole run after DURATION (e.g. 30s, 2m)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Save output files captured before a failure
    #[arg(long)]
    pub keep_partial: bool,

    /// Sources (files, URLs, `-` for stdin) followed by steps such as
    /// `-navigate URL`, `-eval SCRIPT`, `-title`, `-screenshot [file=..,scale=..]`
    #[arg(
        value_name = "SOURCE|STEP",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..
    )]
    pub expression: Vec<String>,
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<()> {
    let invocation = parse_invocation(&args.expression)?;
    let automation = assemble(&invocation, ctx).await?;
    if automation.is_empty() {
        bail!("nothing to run; pass an automation file, a URL or a step");
    }

    let config = ctx.config();
    let allocator = Allocator::new(config.cdp_config())
        .with_browser_url(args.browser.or_else(|| config.browser_url.clone()))
        .with_device_id(args.device.or_else(|| config.device.clone()));
    let output_dir = args.output_dir.unwrap_or_else(|| config.output_dir());

    let cancel = CancellationToken::new();
    let watchers = spawn_cancellation_watchers(&cancel, args.timeout);

    info!(actions = automation.len(), "Running automation");
    let outcome = execute(&automation, &allocator, &cancel).await;
    for watcher in watchers {
        watcher.abort();
    }

    match outcome {
        Ok(result) => {
            print_outputs(&result)?;
            persist_files(&result, &output_dir).await;
            Ok(())
        }
        Err(failure) => {
            if args.keep_partial {
                persist_files(&failure.partial, &output_dir).await;
            }
            Err(anyhow::Error::new(failure.error).context("automation run failed"))
        }
    }
}

fn spawn_cancellation_watchers(
    cancel: &CancellationToken,
    timeout: Option<Duration>,
) -> Vec<JoinHandle<()>> {
    let mut watchers = Vec::new();

    let token = cancel.clone();
    watchers.push(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling run");
            token.cancel();
        }
    }));

    if let Some(timeout) = timeout {
        let token = cancel.clone();
        watchers.push(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            warn!(timeout = ?timeout, "Run timed out; cancelling");
            token.cancel();
        }));
    }

    watchers
}

/// Compile sources and steps into one automation, in command-line order.
pub async fn assemble(invocation: &Invocation, ctx: &CliContext) -> Result<Automation> {
    let mut automation = Automation::default();

    for source in &invocation.sources {
        match source {
            Source::Url(url) => automation.push(bind(&Task::navigate(url.clone()))),
            Source::File(path) => automation.extend(load_file(&resolve(ctx, path)).await?),
            Source::Stdin => automation.extend(load_stdin().await?),
        }
    }

    for step in &invocation.steps {
        match step {
            Step::Task(task) => automation.push(bind(task)),
            Step::EvalFile { name, path } => {
                let path = resolve(ctx, path);
                let script = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read script {}", path.display()))?;
                automation.push(bind(&Task::Eval(Eval {
                    name: name.clone(),
                    script,
                })));
            }
            Step::RunFile(path) => automation.extend(load_file(&resolve(ctx, path)).await?),
            Step::Flow(name) => {
                let workspace = ctx
                    .workspace()
                    .await?
                    .context("no .soulscript workspace found")?;
                let entry = workspace
                    .get(name)
                    .with_context(|| format!("automation not found {name:?}"))?;
                automation.extend(Automation::from_config(&entry.automation));
            }
        }
    }

    Ok(automation)
}

fn resolve(ctx: &CliContext, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        ctx.working_dir().join(path)
    }
}

async fn load_file(path: &Path) -> Result<Automation> {
    let file = read_automation_file(path).await?;
    Ok(Automation::bind(&file.flatten()))
}

async fn load_stdin() -> Result<Automation> {
    let mut contents = String::new();
    tokio::io::stdin()
        .read_to_string(&mut contents)
        .await
        .context("Failed to read automation from stdin")?;
    // JSON documents are valid YAML.
    let file = AutomationFile::decode(&contents, FileFormat::Yaml)
        .context("Failed to decode automation from stdin")?;
    Ok(Automation::bind(&file.flatten()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::workspace::WORKSPACE_DIR;
    use soulscript_core_types::Expression;

    fn context(dir: &Path) -> CliContext {
        CliContext::new(
            AppConfig::default(),
            dir.join("config.yaml"),
            dir.to_path_buf(),
        )
    }

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn sources_and_steps_compile_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("steps.yaml"),
            "automations:\n  - tasks:\n      - reload\n  - tasks:\n      - stop\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("probe.js"), "location.href").unwrap();

        let invocation = parse_invocation(&args(&[
            "https://example.com",
            "steps.yaml",
            "-eval",
            "@probe.js",
            "-title",
        ]))
        .unwrap();
        let automation = assemble(&invocation, &context(dir.path())).await.unwrap();

        let expected = Automation::bind(&[
            Task::navigate(Expression::parse("https://example.com").unwrap()),
            Task::Reload,
            Task::Stop,
            Task::Eval(Eval {
                name: "_1".into(),
                script: "location.href".into(),
            }),
            Task::Title(soulscript_core_types::Title {
                name: "title".into(),
            }),
        ]);
        assert_eq!(automation.actions(), expected.actions());
    }

    #[tokio::test]
    async fn flow_runs_a_named_workspace_automation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(WORKSPACE_DIR)).unwrap();
        std::fs::write(
            dir.path().join(WORKSPACE_DIR).join("flows.yaml"),
            "automations:\n  - name: refresh\n    tasks:\n      - reload\n      - version\n",
        )
        .unwrap();
        let ctx = context(dir.path());

        let invocation = parse_invocation(&args(&["-flow", "refresh"])).unwrap();
        let automation = assemble(&invocation, &ctx).await.unwrap();
        assert_eq!(automation.len(), 2);

        let missing = parse_invocation(&args(&["-flow", "absent"])).unwrap();
        let err = assemble(&missing, &ctx).await.unwrap_err();
        assert!(err.to_string().contains("absent"));
    }

    #[tokio::test]
    async fn unreadable_run_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = parse_invocation(&args(&["-run", "missing.yaml"])).unwrap();
        assert!(assemble(&invocation, &context(dir.path())).await.is_err());
    }
}

//! End-to-end engine behaviour against a recording backend.

mod support;

use std::sync::Arc;
use std::time::Duration;

use action_flow::{
    bind, execute, Automation, DefaultFlowExecutor, EvalContext, FlowError, FlowExecutor,
    RunResult, VERSION_OUTPUT,
};
use cdp_adapter::QueryAction;
use serde_json::json;
use soulscript_core_types::{
    ElementTask, Eval, Expression, Screenshot, Selector, Sleep, Task, Title,
    DEFAULT_SCREENSHOT_NAME,
};
use support::{Call, MockAllocator, MockSession};
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

fn navigate(url: &str) -> Task {
    Task::navigate(Expression::parse(url).unwrap())
}

fn eval(name: &str, script: &str) -> Task {
    Task::Eval(Eval {
        name: name.into(),
        script: script.into(),
    })
}

fn title(name: &str) -> Task {
    Task::Title(Title { name: name.into() })
}

async fn run(tasks: &[Task], allocator: &MockAllocator) -> Result<RunResult, action_flow::RunFailure> {
    execute(&Automation::bind(tasks), allocator, &CancellationToken::new()).await
}

#[tokio::test]
async fn navigate_issues_exactly_one_call() {
    let session = MockSession::new();
    let allocator = MockAllocator::new(session.clone());

    let result = assert_ok!(run(&[navigate("https://example.com")], &allocator).await);

    assert!(result.outputs.is_empty());
    assert_eq!(
        session.calls(),
        vec![Call::Navigate("https://example.com".into()), Call::Close]
    );
}

#[tokio::test]
async fn eval_records_raw_output_and_decoded_variable() {
    let session = MockSession::new().with_eval("1+1", json!(2));
    let allocator = MockAllocator::new(session.clone());

    let result = run(&[eval("x", "1+1")], &allocator).await.unwrap();
    assert_eq!(result.output("x"), Some(&json!(2)));

    // A non-map result decodes to an empty map rather than failing.
    let mut ctx = EvalContext::new();
    let mut direct = RunResult::new();
    bind(&eval("x", "1+1"))
        .execute(&session, &mut ctx, &mut direct)
        .await
        .unwrap();
    assert_eq!(ctx.get("x"), Some(&json!({})));
    assert_eq!(direct.output("x"), Some(&json!(2)));
}

#[tokio::test]
async fn failing_click_stops_before_the_next_task() {
    let session = MockSession::new()
        .failing_when(|call| *call == Call::Query(QueryAction::Click, "#a".into()));
    let allocator = MockAllocator::new(session.clone());

    let tasks = [
        Task::Click(ElementTask::plain("#a")),
        Task::Click(ElementTask::structured(vec![Selector::new("#b")])),
    ];
    let failure = run(&tasks, &allocator).await.unwrap_err();

    assert!(matches!(failure.error, FlowError::StepFailed { .. }));
    assert_eq!(
        session.actions(),
        vec![Call::Query(QueryAction::Click, "#a".into())]
    );
    assert!(failure.partial.is_empty());
    // The session is still released.
    assert_eq!(session.calls().last(), Some(&Call::Close));
}

#[tokio::test]
async fn screenshot_buffer_exists_before_scaled_capture() {
    let session = MockSession::new()
        .failing_when(|call| matches!(call, Call::ElementScreenshot { .. }));
    let allocator = MockAllocator::new(session.clone());

    let task = Task::Screenshot(Screenshot {
        name: "out.png".into(),
        selector: "#el".into(),
        scale: Some(2.0),
        ..Screenshot::default()
    });
    let failure = run(&[task], &allocator).await.unwrap_err();

    assert_eq!(failure.partial.file("out.png"), Some(&[][..]));
    assert_eq!(
        session.actions(),
        vec![Call::ElementScreenshot {
            target: "#el".into(),
            scale: Some(2.0)
        }]
    );
}

#[tokio::test]
async fn scaled_element_screenshot_fills_the_buffer() {
    let session = MockSession::new();
    let allocator = MockAllocator::new(session.clone());

    let task = Task::Screenshot(Screenshot {
        name: "out.png".into(),
        selector: "#el".into(),
        scale: Some(2.0),
        ..Screenshot::default()
    });
    let result = run(&[task], &allocator).await.unwrap();
    assert_eq!(result.file("out.png"), Some(&b"element-png"[..]));
}

#[tokio::test]
async fn unscaled_and_viewport_screenshots() {
    let session = MockSession::new();
    let allocator = MockAllocator::new(session.clone());

    let tasks = [
        Task::Screenshot(Screenshot::default()),
        Task::Screenshot(Screenshot {
            name: "el.png".into(),
            selector: "#el".into(),
            scale: Some(0.0),
            ..Screenshot::default()
        }),
    ];
    let result = run(&tasks, &allocator).await.unwrap();

    assert_eq!(
        result.file(DEFAULT_SCREENSHOT_NAME),
        Some(&b"viewport-png"[..])
    );
    assert_eq!(
        session.actions(),
        vec![
            Call::CaptureScreenshot,
            Call::ElementScreenshot {
                target: "#el".into(),
                scale: None
            }
        ]
    );
}

#[tokio::test]
async fn middle_failure_keeps_only_earlier_contributions() {
    let session = MockSession::new()
        .failing_when(|call| matches!(call, Call::Query(_, target) if target == "#broken"));
    let allocator = MockAllocator::new(session.clone());

    let tasks = [
        title("a"),
        Task::WaitVisible(ElementTask::plain("#broken")),
        title("c"),
    ];
    let failure = run(&tasks, &allocator).await.unwrap_err();

    assert_eq!(failure.partial.outputs.len(), 1);
    assert_eq!(failure.partial.output("a"), Some(&json!("Example Domain")));
    assert!(failure.partial.output("c").is_none());
    assert_eq!(
        session.actions(),
        vec![
            Call::Title,
            Call::Query(QueryAction::WaitVisible, "#broken".into())
        ]
    );
    assert!(failure.error.to_string().contains("#broken"));
}

#[tokio::test]
async fn later_steps_see_earlier_outputs() {
    let session = MockSession::new()
        .with_eval("user()", json!({"id": "42", "role": "admin"}))
        .with_title("Dashboard");
    let allocator = MockAllocator::new(session.clone());

    let tasks = [
        eval("user", "user()"),
        navigate("https://example.com/users/${user.id}"),
        title("page"),
        navigate("https://example.com/search?q=${page}"),
    ];
    let result = run(&tasks, &allocator).await.unwrap();

    assert_eq!(result.output("page"), Some(&json!("Dashboard")));
    assert_eq!(
        session.actions(),
        vec![
            Call::Evaluate("user()".into()),
            Call::Navigate("https://example.com/users/42".into()),
            Call::Title,
            Call::Navigate("https://example.com/search?q=Dashboard".into()),
        ]
    );
}

#[tokio::test]
async fn undeclared_variable_makes_navigation_a_no_op() {
    let session = MockSession::new();
    let allocator = MockAllocator::new(session.clone());

    let tasks = [navigate("https://example.com/${missing}"), Task::Reload];
    let result = run(&tasks, &allocator).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(session.actions(), vec![Call::Reload]);
}

#[tokio::test]
async fn structured_selectors_run_before_plain_one() {
    let session = MockSession::new();
    let allocator = MockAllocator::new(session.clone());

    let task = Task::DoubleClick(ElementTask {
        selector: "#a".into(),
        selectors: vec![Selector::new("#b"), Selector::new("#c")],
        options: None,
    });
    run(&[task], &allocator).await.unwrap();

    assert_eq!(
        session.actions(),
        vec![
            Call::Query(QueryAction::DoubleClick, "#b".into()),
            Call::Query(QueryAction::DoubleClick, "#c".into()),
            Call::Query(QueryAction::DoubleClick, "#a".into()),
        ]
    );
}

#[tokio::test]
async fn parameterless_steps_map_to_backend_calls() {
    let session = MockSession::new();
    let allocator = MockAllocator::new(session.clone());

    let tasks = [
        Task::NavigateBack,
        Task::NavigateForward,
        Task::Reload,
        Task::Stop,
        Task::Blur(ElementTask::plain("#f")),
        Task::Clear(ElementTask::plain("#f")),
    ];
    run(&tasks, &allocator).await.unwrap();

    assert_eq!(
        session.actions(),
        vec![
            Call::Back,
            Call::Forward,
            Call::Reload,
            Call::Stop,
            Call::Query(QueryAction::Blur, "#f".into()),
            Call::Query(QueryAction::Clear, "#f".into()),
        ]
    );
}

#[tokio::test]
async fn known_device_is_emulated_first() {
    let session = MockSession::new();
    let allocator = MockAllocator::new(session.clone()).with_device("iPhoneX");

    run(&[Task::Reload], &allocator).await.unwrap();
    assert_eq!(
        session.actions(),
        vec![Call::Emulate("iPhoneX".into()), Call::Reload]
    );
}

#[tokio::test]
async fn unknown_device_runs_without_emulation() {
    let session = MockSession::new();
    let allocator = MockAllocator::new(session.clone()).with_device("Nokia3310");

    run(&[Task::Reload], &allocator).await.unwrap();
    assert_eq!(session.actions(), vec![Call::Reload]);
}

#[tokio::test]
async fn session_open_failure_returns_empty_result() {
    let mut allocator = MockAllocator::new(MockSession::new());
    allocator.fail_open = true;

    let failure = assert_err!(run(&[Task::Reload], &allocator).await);
    assert!(matches!(failure.error, FlowError::SessionUnavailable(_)));
    assert!(failure.partial.is_empty());
}

#[tokio::test]
async fn failed_eval_records_nothing() {
    let session = MockSession::new().failing_when(|call| matches!(call, Call::Evaluate(_)));
    let allocator = MockAllocator::new(session.clone());

    let failure = run(&[eval("x", "throw 1")], &allocator).await.unwrap_err();
    assert!(failure.partial.output("x").is_none());
}

#[tokio::test]
async fn version_is_recorded() {
    let session = MockSession::new();
    let allocator = MockAllocator::new(session.clone());

    let result = run(&[Task::Version], &allocator).await.unwrap();
    assert_eq!(
        result.output(VERSION_OUTPUT).unwrap()["product"],
        json!("HeadlessChrome/120.0.0.0")
    );
}

#[tokio::test]
async fn binding_twice_gives_identical_independent_actions() {
    let task = navigate("https://example.com/${user.id}");
    let first = bind(&task);
    let second = bind(&task);
    assert_eq!(first, second);

    let session = MockSession::new();
    for action in [&first, &second] {
        let mut ctx = EvalContext::new();
        ctx.set("user", json!({"id": "1"}));
        let mut result = RunResult::new();
        action.execute(&session, &mut ctx, &mut result).await.unwrap();
    }
    assert_eq!(
        session.calls(),
        vec![
            Call::Navigate("https://example.com/1".into()),
            Call::Navigate("https://example.com/1".into()),
        ]
    );
}

#[tokio::test]
async fn cancellation_interrupts_the_running_action() {
    let session = MockSession::new();
    let allocator = Arc::new(MockAllocator::new(session.clone()));
    let executor = DefaultFlowExecutor::new(allocator);
    let token = executor.cancellation_token();

    let automation = Automation::bind(&[
        Task::Sleep(Sleep {
            duration: Duration::from_secs(30),
        }),
        Task::Reload,
    ]);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let failure = executor.execute(&automation).await.unwrap_err();
    assert!(matches!(failure.error, FlowError::Cancelled));
    assert_eq!(session.actions(), Vec::<Call>::new());
    assert_eq!(session.calls(), vec![Call::Close]);
}

#[tokio::test]
async fn runs_are_independent() {
    let session = MockSession::new().with_eval("v()", json!({"k": "v"}));
    let allocator = MockAllocator::new(session.clone());

    let first = run(&[eval("a", "v()")], &allocator).await.unwrap();
    let second = run(&[navigate("https://x.test/${a.k}")], &allocator)
        .await
        .unwrap();

    assert_eq!(first.outputs.len(), 1);
    assert!(second.is_empty());
    // The second run has no `a` binding, so its navigation is skipped.
    assert!(!session
        .actions()
        .iter()
        .any(|call| matches!(call, Call::Navigate(_))));
}

use std::fs;
use std::path::Path;

use soulscript::cli::{parse_invocation, Source, Step};
use soulscript::workspace::{read_automation_file, WORKSPACE_DIR};
use soulscript::{AppConfig, Workspace};
use tokio_test::{assert_err, assert_ok};

fn demo_root() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/demos"))
}

#[tokio::test]
async fn demo_workspace_loads() {
    let workspace = assert_ok!(Workspace::load(demo_root()).await);
    assert_eq!(
        workspace.names().collect::<Vec<_>>(),
        vec!["example", "mobile-shot", "more-info"]
    );
}

#[tokio::test]
async fn demo_files_pass_decoding() {
    let dir = demo_root().join(WORKSPACE_DIR);
    for name in ["example.yaml", "mobile.json"] {
        assert_ok!(read_automation_file(&dir.join(name)).await);
    }
}

#[tokio::test]
async fn workspace_from_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join(WORKSPACE_DIR)).unwrap();
    fs::create_dir_all(dir.path().join("site/pages")).unwrap();
    fs::write(
        dir.path().join(WORKSPACE_DIR).join("flows.yml"),
        "automations:\n  - name: home\n    tasks:\n      - navigate: { url: 'https://example.com' }\n",
    )
    .unwrap();

    let workspace = assert_ok!(Workspace::open(&dir.path().join("site/pages")).await)
        .expect("workspace should be found");
    assert_eq!(workspace.root(), dir.path());
    assert!(workspace.get("home").is_some());
}

#[tokio::test]
async fn unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flow.hcl");
    fs::write(&path, "automation {}").unwrap();
    assert_err!(read_automation_file(&path).await);
}

#[test]
fn command_line_mixes_sources_and_steps() {
    let args: Vec<String> = ["flows.yaml", "about:blank", "-flow", "home", "-version"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let invocation = parse_invocation(&args).unwrap();

    assert_eq!(invocation.sources.len(), 2);
    assert!(matches!(invocation.sources[1], Source::Url(_)));
    assert_eq!(invocation.steps[0], Step::Flow("home".into()));
}

#[test]
fn config_example_parses() {
    let raw = fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/config/config.yaml.example"
    ))
    .unwrap();
    let config: AppConfig = serde_yaml::from_str(&raw).unwrap();
    assert_eq!(
        config.output_dir(),
        Path::new("./soulscript-output").to_path_buf()
    );
}

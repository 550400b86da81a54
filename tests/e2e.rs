use cc_disco_pie::config::UserConfig;
use cc_disco_pie::context::ContextMapping;
use cc_disco_pie::errors::ScaffoldError;
use cc_disco_pie::{cc_disco_pie, Scaffold, ScaffoldOptions, StandardLoader};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

fn shipped_template() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("template")
}

fn config(dir: &Path) -> UserConfig {
    UserConfig { default_context: ContextMapping::new(), replay_dir: dir.join("replay") }
}

fn extra(pairs: &[(&str, &str)]) -> ContextMapping {
    pairs.iter().map(|(k, v)| (k.to_string(), Value::from(*v))).collect()
}

#[test]
fn generates_web_service_skeleton() {
    let work = tempfile::tempdir().unwrap();
    let opts = ScaffoldOptions {
        output_dir: work.path().join("out"),
        extra_context: extra(&[("project_name", "Order Service"), ("service_name", "Order-Api")]),
        ..ScaffoldOptions::default()
    };

    let project = cc_disco_pie(&shipped_template(), config(work.path()), &opts).unwrap();
    assert_eq!(project, work.path().join("out/order-service"));

    let app = fs::read_to_string(project.join("app/app.py")).unwrap();
    assert!(app.contains("from app.routes import hello_order_api, goodbye_order_api"));
    assert!(app.contains("prefix=\"/hello-order-api\""));
    assert!(app.contains("service=\"Order-Api\""));
    assert!(project.join("app/routes/hello_order_api.py").is_file());
    assert!(project.join("app/routes/goodbye_order_api.py").is_file());

    let readme = fs::read_to_string(project.join("README.md")).unwrap();
    assert!(readme.starts_with("# Order Service\n"));
}

#[test]
fn writes_replay_and_replays_it() {
    let work = tempfile::tempdir().unwrap();
    let first = ScaffoldOptions {
        output_dir: work.path().join("first"),
        extra_context: extra(&[("python_version", "3.11")]),
        ..ScaffoldOptions::default()
    };
    cc_disco_pie(&shipped_template(), config(work.path()), &first).unwrap();

    let stored: Value =
        serde_json::from_str(&fs::read_to_string(work.path().join("replay/template.json")).unwrap()).unwrap();
    assert_eq!(stored["cookiecutter"]["python_version"], json!("3.11"));
    assert_eq!(stored["cookiecutter"]["repo_name"], json!("disco-pie-service"));

    let again = ScaffoldOptions { output_dir: work.path().join("second"), replay: true, ..ScaffoldOptions::default() };
    let project = cc_disco_pie(&shipped_template(), config(work.path()), &again).unwrap();
    assert_eq!(project, work.path().join("second/disco-pie-service"));
}

#[test]
fn replay_conflicts_with_extra_context() {
    let work = tempfile::tempdir().unwrap();
    let opts = ScaffoldOptions { replay: true, extra_context: extra(&[("a", "b")]), ..ScaffoldOptions::default() };
    let err = Scaffold::disco_pie(config(work.path()))
        .run(&shipped_template(), &opts, &mut Cursor::new(Vec::<u8>::new()), &mut Vec::<u8>::new())
        .unwrap_err();
    assert!(matches!(err, ScaffoldError::Usage(_)));
}

#[test]
fn interactive_answers_drive_generation() {
    let work = tempfile::tempdir().unwrap();
    let opts = ScaffoldOptions { output_dir: work.path().join("out"), ..ScaffoldOptions::default() };
    // project_name, repo_name (default), service_name, author, python_version
    let answers = "Billing\n\nledger\n\n2\n";
    let mut output = Vec::new();

    let project = Scaffold::disco_pie(config(work.path()))
        .run(&shipped_template(), &opts, &mut Cursor::new(answers.as_bytes().to_vec()), &mut output)
        .unwrap();

    assert_eq!(project, work.path().join("out/billing"));
    let shown = String::from_utf8(output).unwrap();
    assert!(shown.contains("repo_name [billing]: "));
    assert!(shown.contains("2 - 3.10"));
    let app = fs::read_to_string(project.join("app/app.py")).unwrap();
    assert!(app.contains("hello_ledger"));
}

#[test]
fn user_defaults_apply_before_extra_context() {
    let work = tempfile::tempdir().unwrap();
    let mut cfg = config(work.path());
    cfg.default_context = extra(&[("project_name", "From Config"), ("author", "Casey")]);
    let opts = ScaffoldOptions {
        output_dir: work.path().join("out"),
        extra_context: extra(&[("author", "Sam")]),
        ..ScaffoldOptions::default()
    };

    cc_disco_pie(&shipped_template(), cfg, &opts).unwrap();
    let stored: Value =
        serde_json::from_str(&fs::read_to_string(work.path().join("replay/template.json")).unwrap()).unwrap();
    assert_eq!(stored["cookiecutter"]["project_name"], json!("From Config"));
    assert_eq!(stored["cookiecutter"]["author"], json!("Sam"));
}

#[test]
fn standard_template_is_rejected_by_override() {
    let work = tempfile::tempdir().unwrap();
    let template = work.path().join("plain");
    fs::create_dir_all(template.join("{{cookiecutter.name}}")).unwrap();
    fs::write(template.join("cookiecutter.json"), r#"{"name": "demo"}"#).unwrap();
    let opts = ScaffoldOptions { output_dir: work.path().join("out"), ..ScaffoldOptions::default() };

    let err = cc_disco_pie(&template, config(work.path()), &opts).unwrap_err();
    assert!(matches!(err, ScaffoldError::ContextNotFound { ref path } if path.ends_with("cc-disco-pie.json")));

    // The same template works through the generic loader.
    let project = Scaffold::new(Box::new(StandardLoader), config(work.path()))
        .run(
            &template,
            &ScaffoldOptions { no_input: true, ..opts },
            &mut Cursor::new(Vec::<u8>::new()),
            &mut Vec::<u8>::new(),
        )
        .unwrap();
    assert_eq!(project, work.path().join("out/demo"));
}

#[test]
fn generates_from_inside_the_template_directory() {
    let work = tempfile::tempdir().unwrap();
    let opts = ScaffoldOptions { output_dir: work.path().join("out"), ..ScaffoldOptions::default() };

    // Every other test here uses absolute paths, so switching directories is safe.
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(shipped_template()).unwrap();
    let from_dot = cc_disco_pie(Path::new("."), config(work.path()), &opts);
    std::env::set_current_dir(previous).unwrap();

    assert_eq!(from_dot.unwrap(), work.path().join("out/disco-pie-service"));
    assert!(work.path().join("replay/template.json").is_file());
}

#[test]
fn generates_from_a_parent_relative_path() {
    let work = tempfile::tempdir().unwrap();
    let opts = ScaffoldOptions { output_dir: work.path().join("out"), ..ScaffoldOptions::default() };
    let template = shipped_template().join("{{cookiecutter.repo_name}}/..");

    cc_disco_pie(&template, config(work.path()), &opts).unwrap();
    assert!(work.path().join("replay/template.json").is_file());
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

async fn drain(mut rx: mpsc::Receiver<String>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(line) = rx.recv().await {
        lines.push(line);
    }
    lines
}

#[tokio::test]
async fn command_builder_streams_tool_output_as_progress() {
    let dir = tempfile::tempdir().unwrap();
    let builder = CommandBuilder::new(
        "/bin/sh",
        vec!["-c".to_string(), "echo checking out; echo compiling".to_string()],
    );
    let (tx, rx) = mpsc::channel(16);

    let request = BuildRequest::new("demo");
    let properties = builder.run(&request, dir.path(), &tx).await.unwrap();
    drop(tx);

    assert_eq!(drain(rx).await, vec!["checking out", "compiling"]);
    assert_eq!(properties.get("exit.code").map(String::as_str), Some("0"));
    assert_eq!(properties.get("builder.command").map(String::as_str), Some("/bin/sh"));
}

#[tokio::test]
async fn command_builder_writes_properties_file_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let builder = CommandBuilder::new(
        "/bin/sh",
        vec!["-c".to_string(), "cat \"$BF_BUILD_PROPERTIES\"".to_string()],
    );
    let (tx, rx) = mpsc::channel(16);

    let request = BuildRequest::new("demo")
        .with_property("build.target", "dist")
        .with_property("clean", "true");
    builder.run(&request, dir.path(), &tx).await.unwrap();
    drop(tx);

    // keys are written sorted, values untouched
    assert_eq!(drain(rx).await, vec!["build.target=dist", "clean=true"]);
}

#[tokio::test]
async fn command_builder_exposes_the_project_name() {
    let dir = tempfile::tempdir().unwrap();
    let builder =
        CommandBuilder::new("/bin/sh", vec!["-c".to_string(), "echo \"building $BF_PROJECT\"".to_string()]);
    let (tx, rx) = mpsc::channel(16);

    builder.run(&BuildRequest::new("connectfour"), dir.path(), &tx).await.unwrap();
    drop(tx);

    assert_eq!(drain(rx).await, vec!["building connectfour"]);
}

#[tokio::test]
async fn failing_tool_reports_its_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    let builder = CommandBuilder::new("/bin/sh", vec!["-c".to_string(), "exit 3".to_string()]);
    let (tx, _rx) = mpsc::channel(16);

    match builder.run(&BuildRequest::new("demo"), dir.path(), &tx).await {
        Err(BuildError::ToolFailed(status)) => assert_eq!(status.code(), Some(3)),
        other => panic!("expected ToolFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_tool_fails_to_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let builder = CommandBuilder::new("/nonexistent/build-tool", vec![]);
    let (tx, _rx) = mpsc::channel(16);

    assert!(matches!(
        builder.run(&BuildRequest::new("demo"), dir.path(), &tx).await,
        Err(BuildError::Spawn(_))
    ));
}

#[tokio::test]
async fn scripted_builder_replays_its_script() {
    let dir = tempfile::tempdir().unwrap();
    let builder = ScriptedBuilder::new(["checking out", "compiling"])
        .with_property("tests.passed", "12")
        .with_artifact("dist/app.tar", b"tar".to_vec());
    let (tx, rx) = mpsc::channel(16);

    let properties = builder.run(&BuildRequest::new("demo"), dir.path(), &tx).await.unwrap();
    drop(tx);

    assert_eq!(drain(rx).await, vec!["checking out", "compiling"]);
    assert_eq!(properties.get("tests.passed").map(String::as_str), Some("12"));
    assert_eq!(std::fs::read(dir.path().join("dist/app.tar")).unwrap(), b"tar");
}

#[tokio::test]
async fn scripted_builder_can_fail() {
    let dir = tempfile::tempdir().unwrap();
    let builder = ScriptedBuilder::new(["compiling"]).failing("tests failed");
    let (tx, _rx) = mpsc::channel(16);

    match builder.run(&BuildRequest::new("demo"), dir.path(), &tx).await {
        Err(BuildError::Failed(message)) => assert_eq!(message, "tests failed"),
        other => panic!("expected Failed, got {:?}", other),
    }
}

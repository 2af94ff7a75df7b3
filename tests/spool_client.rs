// tests/spool_client.rs

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::tempdir;
use xbot::client::{SpoolClient, TaskClient};
use xbot::config::ClientConfig;
use xbot::errors::ClientError;
use xbot::fs::mock::MockFileSystem;
use xbot::fs::{FileSystem, RealFileSystem};
use xbot::types::TaskResult;

type TestResult = Result<(), Box<dyn Error>>;

fn task_toml(id: &str) -> String {
    format!(
        r#"
instance_id = "{id}"
description = "task {id}"
command_line = "echo {id}"
timeout_seconds = 5
"#
    )
}

fn spool(fs: &MockFileSystem) -> SpoolClient {
    let config = ClientConfig {
        inbox: PathBuf::from("/q/in"),
        outbox: PathBuf::from("/q/out"),
    };
    SpoolClient::new(&config, Arc::new(fs.clone()))
}

#[tokio::test]
async fn serves_tasks_in_file_name_order_and_consumes_them() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/q/in/b.toml", task_toml("b"));
    fs.add_file("/q/in/a.toml", task_toml("a"));
    fs.add_file("/q/in/notes.txt", "ignored");
    let client = spool(&fs);

    let first = client.next_task().await?.expect("first task");
    assert_eq!(first.instance_id, "a");
    assert_eq!(first.timeout_seconds, 5);
    assert!(!fs.is_file(&PathBuf::from("/q/in/a.toml")));

    let second = client.next_task().await?.expect("second task");
    assert_eq!(second.instance_id, "b");

    assert_eq!(client.next_task().await?, None);
    assert!(fs.is_file(&PathBuf::from("/q/in/notes.txt")));
    Ok(())
}

#[tokio::test]
async fn empty_inbox_means_no_task() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/q/in");
    let client = spool(&fs);

    assert_eq!(client.next_task().await?, None);
    Ok(())
}

#[tokio::test]
async fn malformed_task_is_set_aside_as_a_communication_error() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/q/in/bad.toml", "instance_id = ");
    let client = spool(&fs);

    match client.next_task().await {
        Err(ClientError::Communication(msg)) => assert!(msg.contains("rejected task file")),
        other => panic!("expected communication error, got {other:?}"),
    }
    assert!(fs.is_file(&PathBuf::from("/q/in/bad.rejected")));

    // The rejected file is not served again.
    assert_eq!(client.next_task().await?, None);
    Ok(())
}

#[tokio::test]
async fn task_with_zero_timeout_is_rejected() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/q/in/t.toml",
        "instance_id = \"t\"\ncommand_line = \"true\"\ntimeout_seconds = 0\n",
    );
    let client = spool(&fs);

    assert!(matches!(
        client.next_task().await,
        Err(ClientError::Communication(_))
    ));
    Ok(())
}

#[tokio::test]
async fn missing_inbox_is_a_communication_error() -> TestResult {
    let fs = MockFileSystem::new();
    let client = spool(&fs);

    assert!(matches!(
        client.next_task().await,
        Err(ClientError::Communication(_))
    ));
    Ok(())
}

#[tokio::test]
async fn upload_writes_result_file_and_returns_its_location() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/q/out");
    let client = spool(&fs);

    let location = client
        .upload_result(TaskResult {
            instance_id: "run/7".to_string(),
            exit_code: 2,
            captured_output: "boom\n".to_string(),
            artifact_files: Some(vec![PathBuf::from("/res/a.log")]),
        })
        .await?;

    assert!(location.starts_with("/q/out/run_7-"), "{location}");
    assert!(location.ends_with(".result.toml"), "{location}");
    let path = PathBuf::from(&location);

    let stored: toml::Table = toml::from_str(&fs.read_to_string(&path)?)?;
    assert_eq!(stored["instance_id"].as_str(), Some("run/7"));
    assert_eq!(stored["exit_code"].as_integer(), Some(2));
    assert_eq!(stored["captured_output"].as_str(), Some("boom\n"));
    assert_eq!(stored["artifact_files"][0].as_str(), Some("/res/a.log"));
    Ok(())
}

#[tokio::test]
async fn ids_that_sanitize_alike_get_separate_result_files() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/q/out");
    let client = spool(&fs);

    let mut locations = Vec::new();
    for id in ["a/b", "a_b", "a:b"] {
        locations.push(
            client
                .upload_result(TaskResult {
                    instance_id: id.to_string(),
                    exit_code: 0,
                    captured_output: id.to_string(),
                    artifact_files: None,
                })
                .await?,
        );
    }

    locations.sort();
    locations.dedup();
    assert_eq!(locations.len(), 3);
    assert_eq!(fs.files().len(), 3);

    // Uploading the same id again targets the same file.
    let again = client
        .upload_result(TaskResult {
            instance_id: "a/b".to_string(),
            exit_code: 1,
            captured_output: String::new(),
            artifact_files: None,
        })
        .await?;
    assert!(locations.contains(&again));
    assert_eq!(fs.files().len(), 3);
    Ok(())
}

#[tokio::test]
async fn validate_requires_both_directories() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/q/in");
    let client = spool(&fs);
    assert!(!client.validate().await);

    fs.add_dir("/q/out");
    assert!(client.validate().await);
    Ok(())
}

#[tokio::test]
async fn works_against_the_real_filesystem() -> TestResult {
    let dir = tempdir()?;
    let inbox = dir.path().join("in");
    let outbox = dir.path().join("out");
    std::fs::create_dir_all(&inbox)?;
    std::fs::create_dir_all(&outbox)?;
    std::fs::write(inbox.join("001.toml"), task_toml("real"))?;

    let client = SpoolClient::new(
        &ClientConfig {
            inbox: inbox.clone(),
            outbox: outbox.clone(),
        },
        Arc::new(RealFileSystem),
    );

    assert!(client.validate().await);
    let task = client.next_task().await?.expect("task");
    assert_eq!(task.command_line, "echo real");
    assert!(!inbox.join("001.toml").exists());

    let location = client
        .upload_result(TaskResult {
            instance_id: task.instance_id,
            exit_code: 0,
            captured_output: "real\n".to_string(),
            artifact_files: None,
        })
        .await?;
    assert!(PathBuf::from(location).is_file());
    Ok(())
}

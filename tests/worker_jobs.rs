//! End-to-end worker behavior with the preview engine and an injected
//! accelerator probe, over placeholder cache trees.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use snapserve_core::{
    constants::{DEFAULT_PROMPT, DEFAULT_STEPS},
    inference::{backend_for, loader::PipelineLoader, Device},
    server::{handle_job, worker, JobRequest, WorkerState},
    storage::{HubCache, ModelRef},
    Error,
};
use tempfile::tempdir;
use tokio::io::BufReader;

fn seed_cache(root: &Path, model: &ModelRef, revision: &str) {
    let model_dir = root.join(model.cache_dir_name());
    fs::create_dir_all(model_dir.join("snapshots").join(revision)).unwrap();
    fs::create_dir_all(model_dir.join("refs")).unwrap();
    fs::write(model_dir.join("refs").join("main"), revision).unwrap();
}

fn state_for(root: &Path, raw_id: &str) -> WorkerState {
    let model = ModelRef::normalize(raw_id).unwrap();
    let cache = HubCache::new(root);
    let loader = PipelineLoader::new(
        model.clone(),
        cache.clone(),
        true,
        backend_for("preview").unwrap(),
    )
    .with_probe(|| Some(Device::Cuda));
    WorkerState {
        model,
        cache,
        loader: Arc::new(loader),
    }
}

#[tokio::test]
async fn handler_applies_defaults_and_echoes_resolution() {
    let tmp = tempdir().unwrap();
    let model = ModelRef::normalize("Acme/Tiny-Model").unwrap();
    seed_cache(tmp.path(), &model, "abc123");
    let state = state_for(tmp.path(), "https://huggingface.co/Acme/Tiny-Model:main");

    let response = handle_job(&state, JobRequest::default()).await.unwrap();

    assert_eq!(response.model_id, "acme/Tiny-Model");
    assert_eq!(response.prompt, DEFAULT_PROMPT);
    assert_eq!(response.steps, DEFAULT_STEPS);
    assert_eq!(response.cache_root, tmp.path().display().to_string());
    assert_eq!(
        response.snapshot_path,
        tmp.path()
            .join("models--acme--Tiny-Model")
            .join("snapshots")
            .join("abc123")
            .display()
            .to_string()
    );

    let png = STANDARD.decode(response.image_base64_png).unwrap();
    assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn handler_echoes_explicit_prompt_and_steps() {
    let tmp = tempdir().unwrap();
    let model = ModelRef::normalize("acme/tiny").unwrap();
    seed_cache(tmp.path(), &model, "rev0");
    let state = state_for(tmp.path(), "acme/tiny");

    let job: JobRequest =
        serde_json::from_str(r#"{"id":"job-7","input":{"prompt":"a quiet pond","steps":3}}"#)
            .unwrap();
    let response = handle_job(&state, job).await.unwrap();

    assert_eq!(response.prompt, "a quiet pond");
    assert_eq!(response.steps, 3);
}

#[tokio::test]
async fn loader_returns_the_same_handle_across_calls() {
    let tmp = tempdir().unwrap();
    let model = ModelRef::normalize("acme/tiny").unwrap();
    seed_cache(tmp.path(), &model, "rev0");
    let state = state_for(tmp.path(), "acme/tiny");

    let (first, second) =
        tokio::join!(state.loader.get_or_load(), state.loader.get_or_load());
    let first = first.unwrap();
    let second = second.unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let third = state.loader.get_or_load().await.unwrap();
    assert!(Arc::ptr_eq(&first, &third));
}

#[tokio::test]
async fn missing_accelerator_is_fatal_for_the_job() {
    let tmp = tempdir().unwrap();
    let model = ModelRef::normalize("acme/tiny").unwrap();
    seed_cache(tmp.path(), &model, "rev0");

    let cache = HubCache::new(tmp.path());
    let loader = PipelineLoader::new(
        model.clone(),
        cache.clone(),
        true,
        backend_for("preview").unwrap(),
    )
    .with_probe(|| None);
    let state = WorkerState {
        model,
        cache,
        loader: Arc::new(loader),
    };

    let err = handle_job(&state, JobRequest::default()).await.unwrap_err();
    assert!(matches!(err, Error::DeviceNotAvailable));
}

#[tokio::test]
async fn serve_reports_failures_per_job_and_keeps_going() {
    let tmp = tempdir().unwrap();
    let model = ModelRef::normalize("acme/tiny").unwrap();
    seed_cache(tmp.path(), &model, "rev0");
    let state = state_for(tmp.path(), "acme/tiny");

    let input = concat!(
        r#"{"id":"good-1","input":{"steps":1}}"#,
        "\n",
        "this is not json\n",
        r#"{"id":"good-2","input":{"prompt":"still serving","steps":1}}"#,
        "\n",
    );
    let mut output: Vec<u8> = Vec::new();
    worker::serve(state, BufReader::new(input.as_bytes()), &mut output)
        .await
        .unwrap();

    let replies: Vec<serde_json::Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(replies.len(), 3);

    assert_eq!(replies[0]["model_id"], "acme/tiny");
    assert!(replies[0]["error"].is_null());

    assert!(replies[1]["error"]
        .as_str()
        .unwrap()
        .contains("invalid job envelope"));

    assert_eq!(replies[2]["prompt"], "still serving");
}

#[tokio::test]
async fn cache_miss_surfaces_through_the_error_envelope() {
    let tmp = tempdir().unwrap();
    let state = state_for(tmp.path(), "acme/absent");

    let input = r#"{"id":"job-1","input":{}}"#.to_string() + "\n";
    let mut output: Vec<u8> = Vec::new();
    worker::serve(state, BufReader::new(input.as_bytes()), &mut output)
        .await
        .unwrap();

    let reply: serde_json::Value =
        serde_json::from_str(String::from_utf8(output).unwrap().lines().next().unwrap()).unwrap();
    assert_eq!(reply["id"], "job-1");
    let message = reply["error"].as_str().unwrap();
    assert!(message.contains("Model cache dir not found"));
    assert!(message.contains("models--acme--absent"));
}

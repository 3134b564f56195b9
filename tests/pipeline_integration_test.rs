use httpmock::prelude::*;
use place_constraints::config::FileConfig;
use place_constraints::{
    load_default_places, AppConfig, ConstraintError, ConstraintExtractor, ConstraintPipeline,
    ExtractionStatus, Locale, OpenAiService, ServiceErrorPolicy, TimePreference,
};
use std::io::Write;
use std::time::Duration;
use tempfile::Builder;

fn pipeline_for(server: &MockServer, policy: ServiceErrorPolicy) -> ConstraintPipeline<OpenAiService> {
    pipeline_with_retries(server, policy, 1, 10)
}

fn pipeline_with_retries(
    server: &MockServer,
    policy: ServiceErrorPolicy,
    retry_attempts: u32,
    retry_delay_ms: u64,
) -> ConstraintPipeline<OpenAiService> {
    let mut file = FileConfig::default();
    file.service.base_url = server.base_url();
    file.service.retry_attempts = retry_attempts;
    file.service.retry_delay_ms = retry_delay_ms;
    let config = AppConfig::from_parts(Some("sk-test".to_string()), file).unwrap();
    let service = OpenAiService::new(&config).unwrap();
    ConstraintPipeline::new(ConstraintExtractor::new(service, Locale::Ja), policy)
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

fn defaults_file() -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(
        r#"[
            {"place": "新宿歌舞伎町", "type": "観光地", "time_preference": "指定なし", "notes": "デフォルト設定"},
            {"place": "渋谷スクランブル交差点", "type": "観光地", "time_preference": "指定なし", "notes": "デフォルト設定"}
        ]"#
        .as_bytes(),
    )
    .unwrap();
    file
}

#[tokio::test]
async fn test_end_to_end_extract_and_merge() {
    let server = MockServer::start();
    let reply = r#"{"place_constraints": [
        {"place": "新宿歌舞伎町", "type": "観光地", "time_preference": "午前", "notes": ""},
        {"place": "スカイツリー", "type": "観光地", "time_preference": "夜", "notes": ""},
        {"place": "ディナー", "type": "飲食店", "time_preference": "夜", "notes": "スカイツリー周辺"}
    ]}"#;
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("渋谷スクランブル交差点");
        then.status(200).json_body(completion(reply));
    });

    let file = defaults_file();
    let defaults = load_default_places(file.path()).unwrap();
    let pipeline = pipeline_for(&server, ServiceErrorPolicy::Propagate);

    let report = pipeline
        .run(
            &defaults,
            "新宿歌舞伎町には午前中に行きたい。スカイツリーは夜に行きたい。その周辺でディナーをしたい。",
        )
        .await
        .unwrap();

    api_mock.assert();
    assert_eq!(
        report.status,
        ExtractionStatus::Parsed {
            accepted: 3,
            rejected: 0
        }
    );

    let places: Vec<&str> = report.constraints.iter().map(|c| c.place.as_str()).collect();
    assert_eq!(
        places,
        vec!["新宿歌舞伎町", "渋谷スクランブル交差点", "スカイツリー", "ディナー"]
    );
    let kabukicho = report.constraints.get("新宿歌舞伎町").unwrap();
    assert_eq!(kabukicho.time_preference, TimePreference::Morning);
    assert_eq!(kabukicho.notes, "デフォルト設定");
}

#[tokio::test]
async fn test_end_to_end_parse_failure_keeps_defaults() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(completion("申し訳ありません。"));
    });

    let file = defaults_file();
    let defaults = load_default_places(file.path()).unwrap();
    let pipeline = pipeline_for(&server, ServiceErrorPolicy::Propagate);

    let report = pipeline.run(&defaults, "よくわからない文章").await.unwrap();

    assert!(report.is_degraded());
    assert_eq!(report.constraints.as_slice(), defaults.as_slice());
}

#[tokio::test]
async fn test_end_to_end_service_error_policies() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(500);
    });

    let file = defaults_file();
    let defaults = load_default_places(file.path()).unwrap();

    let strict = pipeline_for(&server, ServiceErrorPolicy::Propagate);
    let err = strict.run(&defaults, "text").await.unwrap_err();
    assert!(matches!(err, ConstraintError::ServiceError { .. }));

    let lenient = pipeline_for(&server, ServiceErrorPolicy::FallbackToDefaults);
    let report = lenient.run(&defaults, "text").await.unwrap();
    assert!(matches!(report.status, ExtractionStatus::ServiceFailed { .. }));
    assert_eq!(report.constraints.as_slice(), defaults.as_slice());
}

#[tokio::test]
async fn test_recovered_retry_merges_like_a_single_attempt() {
    let reply = r#"{"place_constraints": [
        {"place": "渋谷スクランブル交差点", "type": "観光地", "time_preference": "夜", "notes": "夜景"},
        {"place": "浅草寺", "type": "観光地", "time_preference": "午前", "notes": ""}
    ]}"#;
    let user_text = "渋谷は夜景を見に夜に。浅草寺は午前中に行きたい。";
    let file = defaults_file();
    let defaults = load_default_places(file.path()).unwrap();

    let direct_server = MockServer::start_async().await;
    direct_server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(completion(reply));
        })
        .await;
    let direct = pipeline_for(&direct_server, ServiceErrorPolicy::Propagate)
        .run(&defaults, user_text)
        .await
        .unwrap();

    let flaky_server = MockServer::start_async().await;
    let failing = flaky_server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(503);
        })
        .await;
    let pipeline = pipeline_with_retries(&flaky_server, ServiceErrorPolicy::Propagate, 3, 300);

    let swap = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        failing.assert_hits_async(1).await;
        failing.delete_async().await;
        flaky_server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(completion(reply));
            })
            .await
    };
    let (recovered, ok_mock) = tokio::join!(pipeline.run(&defaults, user_text), swap);
    let recovered = recovered.unwrap();

    ok_mock.assert_hits_async(1).await;
    assert_eq!(recovered.status, direct.status);
    assert_eq!(recovered.constraints, direct.constraints);
    assert_eq!(
        recovered.constraints.get("渋谷スクランブル交差点").unwrap().notes,
        "夜景"
    );
}

mod common;

use ai_news_pipeline::classifier::build_prompt;
use ai_news_pipeline::config::{ClassifierConfig, HttpConfig};
use ai_news_pipeline::{
    Cohort, GenerationClassifier, GenerationRelevance, OpenAiClassifier, PipelineError, ResilientCaller, RetryPolicy,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn classifier_for(server: &MockServer) -> OpenAiClassifier {
    let config = ClassifierConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    let caller = ResilientCaller::new(&HttpConfig::default(), RetryPolicy::new(2, Duration::from_millis(10))).unwrap();
    OpenAiClassifier::new(config, "sk-test", caller).unwrap()
}

#[tokio::test]
async fn test_classify_sends_chat_request_and_parses_answer() {
    common::init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 100
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::chat_completion(
            "1. Gen Z: Yes\n2. Millennials: Yes\n3. Gen X: No\n4. Boomers: No",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let article = common::candidate("Campus chatbot");
    let relevance = classifier_for(&server).classify(&article).await.unwrap();

    assert_eq!(
        relevance,
        GenerationRelevance {
            gen_z: true,
            millennials: true,
            gen_x: false,
            boomers: false
        }
    );
    assert!(relevance.for_cohort(Cohort::Millennials));
}

#[tokio::test]
async fn test_prompt_includes_article_text() {
    let server = MockServer::start().await;
    let article = common::candidate("Voice assistant for retirees");
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system" },
                { "role": "user", "content": build_prompt(&article) }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::chat_completion(common::GEN_Z_ONLY)))
        .expect(1)
        .mount(&server)
        .await;

    classifier_for(&server).classify(&article).await.unwrap();

    let prompt = build_prompt(&article);
    assert!(prompt.contains("Title: Voice assistant for retirees"));
    assert!(prompt.contains(&format!("Description: {}", article.description)));
    assert!(prompt.contains("4. Boomers: Yes/No"));
}

#[tokio::test]
async fn test_missing_choices_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "x", "choices": [] })))
        .mount(&server)
        .await;

    let err = classifier_for(&server)
        .classify(&common::candidate("Anything"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Upstream(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_off_format_answer_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::chat_completion("This article is relevant to younger readers.")),
        )
        .mount(&server)
        .await;

    let err = classifier_for(&server)
        .classify(&common::candidate("Anything"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Upstream(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_blank_title_is_rejected_without_a_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::chat_completion(common::GEN_Z_ONLY)))
        .expect(0)
        .mount(&server)
        .await;

    let mut article = common::candidate("Untitled");
    article.title = "   ".to_string();

    let err = classifier_for(&server).classify(&article).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_provider_outage_exhausts_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let err = classifier_for(&server)
        .classify(&common::candidate("Anything"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::TransportExhausted { attempts: 2, .. }));
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/proxy/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::chat_completion(common::GEN_Z_ONLY)))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClassifierConfig {
        base_url: format!("{}/proxy", server.uri()),
        ..Default::default()
    };
    let caller = ResilientCaller::new(&HttpConfig::default(), RetryPolicy::new(1, Duration::from_millis(1))).unwrap();
    let classifier = OpenAiClassifier::new(config, "sk-test", caller).unwrap();

    let relevance = classifier.classify(&common::candidate("Anything")).await.unwrap();
    assert!(relevance.gen_z);
}

#[test]
fn test_blank_key_is_configuration_error() {
    let caller = ResilientCaller::new(&HttpConfig::default(), RetryPolicy::default()).unwrap();
    let result = OpenAiClassifier::new(ClassifierConfig::default(), "", caller);
    assert!(matches!(result, Err(PipelineError::Configuration(_))));
}

#[test]
fn test_relevance_parse_tolerates_case_and_punctuation() {
    let relevance = GenerationRelevance::parse("1) gen z: YES.\n\n2. Millennials: no\n3. GEN X - Yes\n4. Boomers: No!\n").unwrap();
    assert!(relevance.gen_z);
    assert!(!relevance.millennials);
    assert!(relevance.gen_x);
    assert!(!relevance.boomers);
}

#[test]
fn test_relevance_parse_rejects_wrong_shape() {
    // three lines
    assert!(GenerationRelevance::parse("1. Gen Z: Yes\n2. Millennials: No\n3. Gen X: No").is_err());
    // cohorts out of order
    assert!(GenerationRelevance::parse("1. Millennials: Yes\n2. Gen Z: No\n3. Gen X: No\n4. Boomers: No").is_err());
    // answer is not yes/no
    assert!(GenerationRelevance::parse("1. Gen Z: Maybe\n2. Millennials: No\n3. Gen X: No\n4. Boomers: No").is_err());
}

#[test]
fn test_relevance_text_is_canonical() {
    let relevance = GenerationRelevance::parse(common::GEN_Z_ONLY).unwrap();
    assert_eq!(relevance.to_relevance_text(), common::GEN_Z_ONLY);
}

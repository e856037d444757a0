//! Router-level flows driven through `tower::ServiceExt::oneshot` against the
//! in-memory stores and a scripted remote service.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use freeplotter_core::{
    ports::{PortError, PreferenceStore, StoryStore},
    session::{NEW_STORY_WARNING, PROMPT_FALLBACK},
    testing::{MemoryPreferences, MemoryStoryStore, RemoteCall, ScriptedRemote},
    GeneratedOutline, LicenseStatus,
};
use serde_json::{json, Value};
use std::{path::PathBuf, sync::Arc, time::Duration};
use studio_lib::{
    adapters::HtmlOutlineRenderer,
    config::Config,
    web::{self, session_task, AppState, Ports},
};
use tower::ServiceExt;

//=========================================================================================
// Harness
//=========================================================================================

struct Harness {
    app: Router,
    state: Arc<AppState>,
    remote: Arc<ScriptedRemote>,
    stories: Arc<MemoryStoryStore>,
    preferences: Arc<MemoryPreferences>,
}

fn test_config(prompt_after_paragraph: bool) -> Arc<Config> {
    Arc::new(Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        api_url: "http://localhost:9".to_string(),
        database_url: "sqlite::memory:".to_string(),
        preferences_path: PathBuf::from("unused-preferences.json"),
        log_level: tracing::Level::INFO,
        allowed_origin: "http://localhost:5173".to_string(),
        openai_api_key: None,
        prompt_model: "gpt-3.5-turbo".to_string(),
        prompt_after_paragraph,
        request_timeout: Duration::from_secs(5),
    })
}

async fn harness_with(
    remote: ScriptedRemote,
    stories: MemoryStoryStore,
    preferences: MemoryPreferences,
    prompt_after_paragraph: bool,
) -> Harness {
    let remote = Arc::new(remote);
    let stories = Arc::new(stories);
    let preferences = Arc::new(preferences);
    let ports = Ports {
        stories: stories.clone(),
        preferences: preferences.clone(),
        prompts: remote.clone(),
        showing: remote.clone(),
        outlines: remote.clone(),
        licenses: remote.clone(),
        orders: remote.clone(),
        renderer: Arc::new(HtmlOutlineRenderer::new()),
    };
    let state = Arc::new(
        AppState::restore(ports, test_config(prompt_after_paragraph))
            .await
            .expect("Failed to restore state"),
    );
    Harness {
        app: web::router(state.clone()),
        state,
        remote,
        stories,
        preferences,
    }
}

async fn harness(remote: ScriptedRemote) -> Harness {
    harness_with(
        remote,
        MemoryStoryStore::new(),
        MemoryPreferences::new(),
        false,
    )
    .await
}

impl Harness {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, body).await;
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn unlock(&self) {
        let (status, body) = self
            .json(Method::POST, "/license", Some(json!({ "key": "FP-GOOD" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unlocked"], true);
    }

    fn count_calls(&self, matches: impl Fn(&RemoteCall) -> bool) -> usize {
        self.remote.calls().iter().filter(|call| matches(call)).count()
    }
}

//=========================================================================================
// Writing session
//=========================================================================================

#[tokio::test]
async fn test_submit_sentence_returns_question_and_persists() {
    let h = harness(ScriptedRemote::new().queue_question(Ok("Who is at the door?".to_string()))).await;

    let (status, body) = h
        .json(
            Method::POST,
            "/session/sentences",
            Some(json!({ "text": "  Someone knocked.  " })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentences"], json!(["Someone knocked."]));
    assert_eq!(body["currentPrompt"], "Who is at the door?");
    assert_eq!(body["isLoading"], false);
    assert_eq!(body["phase"], "drafting");

    let stored = h.stories.list_stories().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].sentences, vec!["Someone knocked."]);
}

#[tokio::test]
async fn test_blank_sentence_is_rejected_without_a_call() {
    let h = harness(ScriptedRemote::new()).await;

    let (status, _) = h
        .send(Method::POST, "/session/sentences", Some(json!({ "text": "   " })))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(h.remote.calls().is_empty());
    assert!(h.stories.is_empty());
}

#[tokio::test]
async fn test_remote_failure_surfaces_message_and_clears_loading() {
    let h = harness(ScriptedRemote::new().queue_question(Err(PortError::Remote {
        message: "Quota exceeded".to_string(),
        cause: "monthly limit".to_string(),
    })))
    .await;

    let (status, bytes) = h
        .send(Method::POST, "/session/sentences", Some(json!({ "text": "It rained." })))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(String::from_utf8(bytes).unwrap(), "Quota exceeded: monthly limit");

    let (_, session) = h.json(Method::GET, "/session", None).await;
    assert_eq!(session["isLoading"], false);
    assert_eq!(session["currentPrompt"], Value::Null);
    assert_eq!(session["sentences"], json!(["It rained."]));
}

#[tokio::test]
async fn test_blank_answer_uses_fallback_question() {
    let h = harness(ScriptedRemote::new().queue_question(Ok(" ".to_string()))).await;

    let (_, body) = h
        .json(Method::POST, "/session/sentences", Some(json!({ "text": "It rained." })))
        .await;
    assert_eq!(body["currentPrompt"], PROMPT_FALLBACK);
}

#[tokio::test]
async fn test_superseded_prompt_response_is_discarded() {
    let h = harness(
        ScriptedRemote::new()
            .queue_question(Ok("newest".to_string()))
            .queue_question(Ok("oldest".to_string())),
    )
    .await;

    // An earlier request is still outstanding when a second sentence arrives.
    let earlier = h.state.session.lock().await.submit_sentence("One.").unwrap();
    let (status, body) = h
        .json(Method::POST, "/session/sentences", Some(json!({ "text": "Two." })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentPrompt"], "newest");

    session_task::run_prompt(&h.state, earlier).await.unwrap();

    let (_, session) = h.json(Method::GET, "/session", None).await;
    assert_eq!(session["currentPrompt"], "newest");
    assert_eq!(session["sentences"], json!(["One.", "Two."]));
}

#[tokio::test]
async fn test_submit_promote_and_reload() {
    let h = harness(ScriptedRemote::new()).await;

    h.send(Method::POST, "/session/sentences", Some(json!({ "text": "The rain fell." })))
        .await;
    h.send(Method::POST, "/session/sentences", Some(json!({ "text": "She ran." })))
        .await;
    let (status, body) = h.json(Method::POST, "/session/paragraphs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paragraphs"], json!(["The rain fell. She ran."]));
    assert_eq!(body["sentences"], json!([]));
    assert_eq!(body["phase"], "paragraph");
    let story_id = body["storyId"].clone();

    // Promoting again with nothing pending changes nothing.
    let (_, again) = h.json(Method::POST, "/session/paragraphs", None).await;
    assert_eq!(again["paragraphs"], json!(["The rain fell. She ran."]));

    let stored: Vec<_> = h.stories.list_stories().await.unwrap();
    let reloaded = harness_with(
        ScriptedRemote::new(),
        MemoryStoryStore::with_stories(stored),
        MemoryPreferences::new(),
        false,
    )
    .await;
    let (_, session) = reloaded.json(Method::GET, "/session", None).await;
    assert_eq!(session["storyId"], story_id);
    assert_eq!(session["paragraphs"], json!(["The rain fell. She ran."]));
    assert_eq!(session["currentPrompt"], Value::Null);
}

#[tokio::test]
async fn test_paragraph_prompt_when_configured() {
    let h = harness_with(
        ScriptedRemote::new()
            .queue_question(Ok("first".to_string()))
            .queue_question(Ok("About the paragraph?".to_string())),
        MemoryStoryStore::new(),
        MemoryPreferences::new(),
        true,
    )
    .await;

    h.send(Method::POST, "/session/sentences", Some(json!({ "text": "The rain fell." })))
        .await;
    let (_, body) = h.json(Method::POST, "/session/paragraphs", None).await;

    assert_eq!(body["currentPrompt"], "About the paragraph?");
    assert_eq!(h.count_calls(|c| matches!(c, RemoteCall::Question(_))), 2);
}

#[tokio::test]
async fn test_suggestion_is_dismissed_when_its_paragraph_changes() {
    let h = harness(ScriptedRemote::new()).await;
    h.send(Method::POST, "/session/sentences", Some(json!({ "text": "She was sad." })))
        .await;
    h.send(Method::POST, "/session/paragraphs", None).await;

    let (status, body) = h
        .json(Method::POST, "/session/paragraphs/0/suggestion", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestion"]["currentSuggestion"], "Shown: She was sad.");
    assert_eq!(body["suggestion"]["isLoading"], false);

    let (status, body) = h
        .json(
            Method::PUT,
            "/session/paragraphs/0",
            Some(json!({ "text": "Tears ran down her face." })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paragraphs"], json!(["Tears ran down her face."]));
    assert_eq!(body["suggestion"]["currentSuggestion"], Value::Null);

    let stored = h.stories.list_stories().await.unwrap();
    assert_eq!(stored[0].paragraphs, vec!["Tears ran down her face."]);
}

#[tokio::test]
async fn test_suggestion_out_of_range() {
    let h = harness(ScriptedRemote::new()).await;
    let (status, _) = h
        .send(Method::POST, "/session/paragraphs/3/suggestion", None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(h.remote.calls().is_empty());
}

//=========================================================================================
// Stories
//=========================================================================================

#[tokio::test]
async fn test_select_story_and_list() {
    let h = harness(ScriptedRemote::new()).await;
    h.send(Method::POST, "/session/sentences", Some(json!({ "text": "First story." })))
        .await;
    let (_, first) = h.json(Method::GET, "/session", None).await;
    let first_id = first["storyId"].as_str().unwrap().to_string();

    h.unlock().await;
    // Story ids are time-ordered.
    tokio::time::sleep(Duration::from_millis(5)).await;
    let (status, fresh) = h
        .json(Method::POST, "/stories", Some(json!({ "confirm": false })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(fresh["phase"], "empty");
    h.send(Method::POST, "/session/sentences", Some(json!({ "text": "Second story." })))
        .await;

    let (_, list) = h.json(Method::GET, "/stories", None).await;
    let list = list.as_array().unwrap().clone();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["paragraph"], "Second story.");
    assert_eq!(list[1]["id"], first_id.as_str());

    let (status, selected) = h
        .json(Method::POST, &format!("/stories/{}/select", first_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(selected["sentences"], json!(["First story."]));

    let (status, _) = h.send(Method::POST, "/stories/not-an-id/select", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_new_story_requires_license_and_confirmation() {
    let h = harness(ScriptedRemote::new()).await;
    h.send(Method::POST, "/session/sentences", Some(json!({ "text": "Done." })))
        .await;
    h.send(Method::POST, "/session/paragraphs", None).await;

    let (status, _) = h
        .send(Method::POST, "/stories", Some(json!({ "confirm": true })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    h.unlock().await;
    let (status, bytes) = h
        .send(Method::POST, "/stories", Some(json!({ "confirm": false })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(String::from_utf8(bytes).unwrap(), NEW_STORY_WARNING);

    let (status, body) = h
        .json(Method::POST, "/stories", Some(json!({ "confirm": true })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["paragraphs"], json!([]));
}

//=========================================================================================
// License
//=========================================================================================

#[tokio::test]
async fn test_confirmed_key_is_stored() {
    let h = harness(ScriptedRemote::new()).await;
    h.unlock().await;
    let stored = h.preferences.license_key().await.unwrap().unwrap();
    assert_eq!(stored.as_str(), "FP-GOOD");
}

#[tokio::test]
async fn test_stored_key_is_revalidated_on_start() {
    let h = harness_with(
        ScriptedRemote::new(),
        MemoryStoryStore::new(),
        MemoryPreferences::with_license_key("FP-STORED"),
        false,
    )
    .await;

    assert_eq!(h.count_calls(|c| matches!(c, RemoteCall::License(_))), 1);
    assert_eq!(h.state.license.lock().await.status(), LicenseStatus::Valid);
}

#[tokio::test]
async fn test_rejected_stored_key_is_cleared_on_start() {
    let h = harness_with(
        ScriptedRemote::new().with_license_verdict(Ok(false)),
        MemoryStoryStore::new(),
        MemoryPreferences::with_license_key("FP-EXPIRED"),
        false,
    )
    .await;

    assert!(h.preferences.license_key().await.unwrap().is_none());
    let (_, license) = h.json(Method::GET, "/license", None).await;
    assert_eq!(license["status"], "invalid");
    assert_eq!(license["unlocked"], false);
    assert!(license["notice"].as_str().unwrap().contains("expired or invalid"));

    let (_, license) = h.json(Method::POST, "/license/notice/ack", None).await;
    assert_eq!(license["notice"], Value::Null);
    assert_eq!(license["status"], "unchecked");
}

#[tokio::test]
async fn test_rejected_key_clears_the_stored_key() {
    let h = harness_with(
        ScriptedRemote::new().with_license_verdict(Ok(false)),
        MemoryStoryStore::new(),
        MemoryPreferences::new(),
        false,
    )
    .await;
    h.preferences
        .set_license_key(freeplotter_core::LicenseKey::new("FP-OLD").as_ref())
        .await
        .unwrap();

    let (status, body) = h
        .json(Method::POST, "/license", Some(json!({ "key": "FP-BAD" })))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "invalid");
    assert!(h.preferences.license_key().await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_check_keeps_the_stored_key() {
    let h = harness(
        ScriptedRemote::new()
            .with_license_verdict(Err(PortError::Transport("connection refused".to_string()))),
    )
    .await;
    h.preferences
        .set_license_key(freeplotter_core::LicenseKey::new("FP-KEEP").as_ref())
        .await
        .unwrap();

    let (status, _) = h
        .send(Method::POST, "/license", Some(json!({ "key": "FP-NEW" })))
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let stored = h.preferences.license_key().await.unwrap().unwrap();
    assert_eq!(stored.as_str(), "FP-KEEP");
    assert_eq!(h.state.license.lock().await.status(), LicenseStatus::Unchecked);
}

#[tokio::test]
async fn test_failed_check_keeps_a_confirmed_license_unlocked() {
    let h = harness(
        ScriptedRemote::new()
            .queue_license_verdict(Ok(true))
            .queue_license_verdict(Err(PortError::Transport("timeout".to_string()))),
    )
    .await;
    h.unlock().await;

    let (status, _) = h
        .send(Method::POST, "/license", Some(json!({ "key": "FP-OTHER" })))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, license) = h.json(Method::GET, "/license", None).await;
    assert_eq!(license["status"], "valid");
    assert_eq!(license["unlocked"], true);
    let (status, _) = h.send(Method::POST, "/outline/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    let stored = h.preferences.license_key().await.unwrap().unwrap();
    assert_eq!(stored.as_str(), "FP-GOOD");
}

#[tokio::test]
async fn test_overlapping_checks_store_only_the_confirmed_key() {
    let h = harness(ScriptedRemote::new()).await;

    // A check that is still waiting when a newer key is entered.
    let stale = h.state.license.lock().await.begin_check("FP-STALE").unwrap();
    let (status, body) = h
        .json(Method::POST, "/license", Some(json!({ "key": "FP-LATER" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unlocked"], true);

    let late = h.state.license.lock().await.finish_check(stale, Ok(false));
    assert_eq!(late, Ok(None));

    let stored = h.preferences.license_key().await.unwrap().unwrap();
    assert_eq!(stored.as_str(), "FP-LATER");
    let (_, license) = h.json(Method::GET, "/license", None).await;
    assert_eq!(license["status"], "valid");
    assert_eq!(license["notice"], Value::Null);
}

#[tokio::test]
async fn test_acknowledging_without_a_rejection_keeps_the_key() {
    let h = harness(ScriptedRemote::new()).await;
    h.unlock().await;

    let (status, license) = h.json(Method::POST, "/license/notice/ack", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(license["unlocked"], true);
    assert_eq!(license["status"], "valid");
    let stored = h.preferences.license_key().await.unwrap().unwrap();
    assert_eq!(stored.as_str(), "FP-GOOD");
}

//=========================================================================================
// Outline
//=========================================================================================

async fn plot_ids(h: &Harness) -> Vec<String> {
    let (_, outline) = h.json(Method::GET, "/outline", None).await;
    outline["plots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|plot| plot["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_invalid_outline_makes_no_network_call() {
    let h = harness(ScriptedRemote::new()).await;
    h.unlock().await;

    let (status, bytes) = h.send(Method::POST, "/outline/generate", None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "Please add at least a title or 5 plot points."
    );
    assert_eq!(h.count_calls(|c| matches!(c, RemoteCall::Outline(_))), 0);
}

#[tokio::test]
async fn test_generate_outline_document() {
    let h = harness(ScriptedRemote::new().with_outline(Ok(GeneratedOutline {
        premise: "A lighthouse keeper finds a map.".to_string(),
        outline: Vec::new(),
    })))
    .await;
    h.unlock().await;

    let (status, _) = h
        .send(
            Method::PUT,
            "/outline",
            Some(json!({ "title": "The Keeper", "genre": "Mystery", "numChapters": 12 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    for _ in 0..4 {
        let (status, _) = h.send(Method::POST, "/outline/plots", None).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let ids = plot_ids(&h).await;
    for (n, id) in ids.iter().enumerate() {
        h.send(
            Method::PUT,
            &format!("/outline/plots/{}", id),
            Some(json!({ "context": format!("Plot {}", n + 1) })),
        )
        .await;
    }

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/outline/generate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let html = String::from_utf8(
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec(),
    )
    .unwrap();
    assert!(html.contains("The Keeper"));
    assert!(html.contains("A lighthouse keeper finds a map."));

    let requests: Vec<_> = h
        .remote
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            RemoteCall::Outline(request) => Some(request),
            _ => None,
        })
        .collect();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].genre, "Mystery");
    assert_eq!(requests[0].num_chapters, 12);
    assert_eq!(
        requests[0].plots,
        vec!["Plot 1", "Plot 2", "Plot 3", "Plot 4", "Plot 5"]
    );
}

#[tokio::test]
async fn test_plot_editing() {
    let h = harness(ScriptedRemote::new()).await;
    h.send(Method::POST, "/outline/plots", None).await;
    h.send(Method::POST, "/outline/plots", None).await;
    let ids = plot_ids(&h).await;

    let (status, _) = h
        .send(Method::DELETE, &format!("/outline/plots/{}", ids[0]), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, outline) = h
        .json(
            Method::POST,
            "/outline/plots/reorder",
            Some(json!({ "from": ids[2], "to": ids[0] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let reordered: Vec<&str> = outline["plots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|plot| plot["id"].as_str().unwrap())
        .collect();
    assert_eq!(reordered, vec![ids[2].as_str(), ids[0].as_str(), ids[1].as_str()]);

    let (status, outline) = h
        .json(Method::DELETE, &format!("/outline/plots/{}", ids[0]), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outline["plots"].as_array().unwrap().len(), 2);

    let (status, _) = h
        .send(Method::PUT, "/outline", Some(json!({ "genre": "Not A Genre" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_reset_outline_is_gated() {
    let h = harness(ScriptedRemote::new()).await;
    h.send(Method::PUT, "/outline", Some(json!({ "title": "Draft" })))
        .await;

    let (status, _) = h.send(Method::POST, "/outline/reset", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    h.unlock().await;
    let (status, outline) = h.json(Method::POST, "/outline/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outline["title"], "");
    assert_eq!(outline["plots"].as_array().unwrap().len(), 1);
}

//=========================================================================================
// Orders
//=========================================================================================

const BOUNDARY: &str = "freeplotter-test-boundary";

fn order_body(fields: &[(&str, &str)], receipt: Option<&[u8]>) -> Body {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = receipt {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"tximg\"; filename=\"receipt.png\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    Body::from(body)
}

async fn post_order(h: &Harness, body: Body) -> StatusCode {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/order")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(body)
        .unwrap();
    h.app.clone().oneshot(request).await.unwrap().status()
}

const ORDER_FIELDS: [(&str, &str); 5] = [
    ("name", "Ayu"),
    ("email", "ayu@example.com"),
    ("phone", "08123"),
    ("license_type", "2"),
    ("duration", "2"),
];

#[tokio::test]
async fn test_order_flow() {
    let h = harness(ScriptedRemote::new()).await;

    let (status, quote) = h
        .json(Method::GET, "/order/quote?licenseType=2&duration=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["bundlePrice"], 125_000);
    assert_eq!(quote["licenseType"], 2);
    assert!(quote.get("bundle_price").is_none());
    let unique_code = quote["uniqueCode"].as_u64().unwrap();
    assert_eq!(quote["total"].as_u64().unwrap(), 125_000 + unique_code);

    let status = post_order(&h, order_body(&ORDER_FIELDS, Some(b"\x89PNG"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let orders: Vec<_> = h
        .remote
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            RemoteCall::Order(order) => Some(order),
            _ => None,
        })
        .collect();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].price, 125_000 + unique_code);
    assert_eq!(orders[0].phone.as_deref(), Some("08123"));
    assert_eq!(orders[0].receipt.file_name, "receipt.png");

    let (status, last) = h.json(Method::GET, "/order/last", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(last["licenseKey"], "FP-TEST-0001");
    assert!(last["endDate"].is_string());

    // A second order waits until the first is reset.
    let status = post_order(&h, order_body(&ORDER_FIELDS, Some(b"\x89PNG"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = h.send(Method::DELETE, "/order/last", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = h.send(Method::GET, "/order/last", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_without_receipt_is_rejected() {
    let h = harness(ScriptedRemote::new()).await;
    let status = post_order(&h, order_body(&ORDER_FIELDS, None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(h.count_calls(|c| matches!(c, RemoteCall::Order(_))), 0);
}

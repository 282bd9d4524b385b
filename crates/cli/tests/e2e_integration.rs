//! End-to-end integration tests for ctxkeeper.
//!
//! These tests drive full turns through `ChatService` against a scripted
//! provider and on-disk storage, including restart via bulk load.

use std::sync::Arc;

use ctxkeeper_agent::{ChatService, HeuristicTokenizer, PromptAssembler, TurnError};
use ctxkeeper_config::{AppConfig, TokenizerKind};
use ctxkeeper_core::error::ProviderError;
use ctxkeeper_core::message::{Message, Role, SessionKey};
use ctxkeeper_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use ctxkeeper_memory::{ContextStore, FileStorage, Persistence};
use tempfile::TempDir;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence.
struct ScriptedProvider {
    responses: std::sync::Mutex<Vec<Result<String, ProviderError>>>,
    requests: std::sync::Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn texts(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|r| Ok(r.to_string())).collect())
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, n: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[n].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let count = requests.len();
        requests.push(request);

        let responses = self.responses.lock().unwrap();
        if count >= responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{count}, have {}",
                responses.len()
            );
        }
        let text = responses[count].clone()?;
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock".into(),
        })
    }
}

fn persistence(dir: &TempDir) -> Persistence {
    Persistence::new(Arc::new(FileStorage::new(dir.path().join("database"))))
}

fn service(
    store: ContextStore,
    persistence: Persistence,
    provider: Arc<ScriptedProvider>,
) -> ChatService {
    let assembler = PromptAssembler::new(store, persistence, Arc::new(HeuristicTokenizer));
    ChatService::new(assembler, provider)
        .with_model("mock-model")
        .with_system_preamble("You are a helpful assistant.")
}

// ── E2E: turns survive a restart ─────────────────────────────────────────

#[tokio::test]
async fn e2e_history_survives_restart() {
    let dir = TempDir::new().unwrap();
    let key = SessionKey::new(42, 7);

    let first = Arc::new(ScriptedProvider::texts(&["Hello!", "It is sunny."]));
    let svc = service(ContextStore::new(), persistence(&dir), first);
    svc.handle_turn(key, "Hi").await.unwrap();
    svc.handle_turn(key, "Weather?").await.unwrap();
    drop(svc);

    // Restart: fresh store, bulk load from disk
    let store = ContextStore::new();
    let report = persistence(&dir).load_all(&store).await.unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(
        store.get(key).await,
        vec![
            Message::user("Hi"),
            Message::assistant("Hello!"),
            Message::user("Weather?"),
            Message::assistant("It is sunny."),
        ]
    );

    let second = Arc::new(ScriptedProvider::texts(&["You asked about weather."]));
    let svc = service(store, persistence(&dir), second.clone());
    svc.handle_turn(key, "What did I ask?").await.unwrap();

    let sent = second.request(0).messages;
    assert_eq!(sent.len(), 6);
    assert_eq!(sent[0].role, Role::System);
    assert_eq!(sent[4], Message::assistant("It is sunny."));
    assert_eq!(sent[5], Message::user("What did I ask?"));
}

#[tokio::test]
async fn e2e_sessions_are_isolated() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::texts(&["a", "b", "c"]));
    let svc = service(ContextStore::new(), persistence(&dir), provider.clone());

    let alice = SessionKey::new(1, 100);
    let bob = SessionKey::new(1, 200);
    let other_group = SessionKey::new(2, 100);

    svc.handle_turn(alice, "from alice").await.unwrap();
    svc.handle_turn(bob, "from bob").await.unwrap();
    svc.handle_turn(other_group, "elsewhere").await.unwrap();

    // Bob's prompt never saw Alice's exchange
    assert_eq!(provider.request(1).messages.len(), 2);

    let store = svc.assembler().store();
    assert_eq!(store.groups().await, vec![1, 2]);
    assert_eq!(store.participants(1).await, vec![100, 200]);
    assert_eq!(store.get(alice).await[0], Message::user("from alice"));
    assert_eq!(store.get(other_group).await[0], Message::user("elsewhere"));
}

#[tokio::test]
async fn e2e_long_conversation_stays_within_budget() {
    let dir = TempDir::new().unwrap();
    let replies: Vec<String> = (0..12)
        .map(|i| format!("reply number {i} {}", "x".repeat(40)))
        .collect();
    let replies: Vec<&str> = replies.iter().map(String::as_str).collect();
    let provider = Arc::new(ScriptedProvider::texts(&replies));
    let svc = service(ContextStore::new(), persistence(&dir), provider.clone())
        .with_context_length(120);

    let key = SessionKey::new(5, 5);
    let mut trimmed = 0;
    for i in 0..12 {
        let reply = svc
            .handle_turn(key, &format!("question number {i} {}", "y".repeat(40)))
            .await
            .unwrap();
        assert!(reply.prompt_tokens <= 120);
        trimmed += reply.trims;
    }
    assert!(trimmed > 0);

    // The most recent exchange is always kept
    let history = svc.assembler().store().get(key).await;
    assert_eq!(history.last().unwrap().content, replies[11]);

    // Disk holds exactly what memory holds
    let fresh = ContextStore::new();
    persistence(&dir).load_all(&fresh).await.unwrap();
    assert_eq!(fresh.get(key).await, history);
}

#[tokio::test]
async fn e2e_failed_inference_is_retryable() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ProviderError::Timeout("300s".into())),
        Ok("second try worked".into()),
    ]));
    let svc = service(ContextStore::new(), persistence(&dir), provider.clone());
    let key = SessionKey::new(9, 9);

    let err = svc.handle_turn(key, "hello?").await.unwrap_err();
    assert!(matches!(err, TurnError::Inference(ProviderError::Timeout(_))));
    assert!(svc.assembler().store().get(key).await.is_empty());

    let reply = svc.handle_turn(key, "hello?").await.unwrap();
    assert_eq!(reply.content, "second try worked");
    assert_eq!(provider.calls(), 2);
    assert_eq!(svc.assembler().store().len(key).await, 2);
}

#[tokio::test]
async fn e2e_oversized_message_is_rejected_without_calling_backend() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::texts(&[]));
    let svc = service(ContextStore::new(), persistence(&dir), provider.clone())
        .with_context_length(16);

    let err = svc
        .handle_turn(SessionKey::new(1, 1), &"word ".repeat(100))
        .await
        .unwrap_err();
    assert!(matches!(err, TurnError::OversizedTurn { budget: 16, .. }));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn e2e_clear_removes_durable_records() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::texts(&["a", "b", "c"]));
    let store = ContextStore::new();
    let svc = service(store.clone(), persistence(&dir), provider);

    svc.handle_turn(SessionKey::new(1, 1), "one").await.unwrap();
    svc.handle_turn(SessionKey::new(1, 2), "two").await.unwrap();
    svc.handle_turn(SessionKey::new(2, 1), "three").await.unwrap();

    let p = persistence(&dir);
    assert!(p.forget(&store, SessionKey::new(1, 1)).await.unwrap());
    assert!(p.forget_group(&store, 2).await.unwrap());

    let fresh = ContextStore::new();
    let report = p.load_all(&fresh).await.unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(fresh.groups().await, vec![1]);
    assert_eq!(fresh.participants(1).await, vec![2]);

    assert_eq!(p.forget_all(&store).await.unwrap(), 1);
    let fresh = ContextStore::new();
    assert_eq!(p.load_all(&fresh).await.unwrap().loaded, 0);
}

#[tokio::test]
async fn e2e_reasoning_is_not_replayed() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::texts(&[
        "<think>The user says hi.</think>\n\nHi there!",
        "Fine.",
    ]));
    let svc = service(ContextStore::new(), persistence(&dir), provider.clone());
    let key = SessionKey::new(3, 3);

    assert_eq!(svc.handle_turn(key, "hi").await.unwrap().content, "Hi there!");
    svc.handle_turn(key, "how are you").await.unwrap();

    assert_eq!(provider.request(1).messages[2], Message::assistant("Hi there!"));
}

#[tokio::test]
async fn e2e_config_drives_service() {
    let dir = TempDir::new().unwrap();
    let config: AppConfig = toml::from_str(
        r#"
        [llm]
        model = "deepseek-r1:8b"
        pre_prompt = ["You are terse.", "Answer in one line."]
        context_length = 2048
        strip_reasoning = false

        [tokenizer]
        kind = "heuristic"
        "#,
    )
    .unwrap();
    assert_eq!(config.tokenizer.kind, TokenizerKind::Heuristic);

    let provider = Arc::new(ScriptedProvider::texts(&["<think>x</think>ok"]));
    let assembler = PromptAssembler::new(
        ContextStore::new(),
        persistence(&dir),
        Arc::new(HeuristicTokenizer),
    );
    let svc = ChatService::from_config(assembler, provider.clone(), &config.llm);

    let reply = svc.handle_turn(SessionKey::new(1, 1), "hi").await.unwrap();
    assert_eq!(reply.content, "<think>x</think>ok");

    let request = provider.request(0);
    assert_eq!(request.model, "deepseek-r1:8b");
    assert_eq!(
        request.messages[0],
        Message::system("You are terse.\nAnswer in one line.")
    );
}

#[tokio::test]
async fn e2e_concurrent_participants() {
    let dir = TempDir::new().unwrap();
    let replies: Vec<String> = (0..20).map(|i| format!("r{i}")).collect();
    let replies: Vec<&str> = replies.iter().map(String::as_str).collect();
    let provider = Arc::new(ScriptedProvider::texts(&replies));
    let svc = Arc::new(service(ContextStore::new(), persistence(&dir), provider));

    let mut handles = Vec::new();
    for participant in 0..4u64 {
        for turn in 0..5 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                svc.handle_turn(SessionKey::new(1, participant), &format!("p{participant} t{turn}"))
                    .await
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let fresh = ContextStore::new();
    persistence(&dir).load_all(&fresh).await.unwrap();
    for participant in 0..4u64 {
        let key = SessionKey::new(1, participant);
        let history = fresh.get(key).await;
        assert_eq!(history.len(), 10);
        assert_eq!(history, svc.assembler().store().get(key).await);
        for pair in history.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert!(pair[0].content.starts_with(&format!("p{participant} ")));
            assert_eq!(pair[1].role, Role::Assistant);
        }
    }
}

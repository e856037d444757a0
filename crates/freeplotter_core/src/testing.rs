//! Testing utilities.
//!
//! In-memory implementations of every port, for deterministic tests without
//! a database, a preferences file or network access:
//! - `MemoryStoryStore` and `MemoryPreferences` for local persistence
//! - `ScriptedRemote` for the remote services, recording every call

use crate::domain::{
    GeneratedOutline, LicenseKey, OrderReceipt, OrderSubmission, OutlineRequest, OutlineSection,
    QuestionRequest, ShowingRequest, Story, StoryId,
};
use crate::ports::{
    LicenseService, OrderService, OutlineService, PortError, PortResult, PreferenceStore,
    PromptService, ShowingService, StoryStore,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

fn poisoned<T>(_: T) -> PortError {
    PortError::Unexpected("test double lock poisoned".to_string())
}

//=========================================================================================
// Local persistence
//=========================================================================================

/// Story store backed by an ordered map.
#[derive(Default)]
pub struct MemoryStoryStore {
    stories: Mutex<BTreeMap<StoryId, Story>>,
}

impl MemoryStoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stories(stories: impl IntoIterator<Item = Story>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.stories.lock() {
            map.extend(stories.into_iter().map(|story| (story.id, story)));
        }
        store
    }

    pub fn len(&self) -> usize {
        self.stories.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StoryStore for MemoryStoryStore {
    async fn list_stories(&self) -> PortResult<Vec<Story>> {
        let map = self.stories.lock().map_err(poisoned)?;
        Ok(map.values().rev().cloned().collect())
    }

    async fn get_story(&self, id: StoryId) -> PortResult<Option<Story>> {
        let map = self.stories.lock().map_err(poisoned)?;
        Ok(map.get(&id).cloned())
    }

    async fn upsert_story(&self, story: &Story) -> PortResult<()> {
        let mut map = self.stories.lock().map_err(poisoned)?;
        map.insert(story.id, story.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPreferences {
    license_key: Mutex<Option<LicenseKey>>,
    last_order: Mutex<Option<OrderReceipt>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_license_key(key: &str) -> Self {
        Self {
            license_key: Mutex::new(LicenseKey::new(key)),
            last_order: Mutex::new(None),
        }
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferences {
    async fn license_key(&self) -> PortResult<Option<LicenseKey>> {
        Ok(self.license_key.lock().map_err(poisoned)?.clone())
    }

    async fn set_license_key(&self, key: Option<&LicenseKey>) -> PortResult<()> {
        *self.license_key.lock().map_err(poisoned)? = key.cloned();
        Ok(())
    }

    async fn last_order(&self) -> PortResult<Option<OrderReceipt>> {
        Ok(self.last_order.lock().map_err(poisoned)?.clone())
    }

    async fn set_last_order(&self, order: Option<&OrderReceipt>) -> PortResult<()> {
        *self.last_order.lock().map_err(poisoned)? = order.cloned();
        Ok(())
    }
}

//=========================================================================================
// Remote services
//=========================================================================================

/// One call received by [`ScriptedRemote`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Question(QuestionRequest),
    Showing(ShowingRequest),
    Outline(OutlineRequest),
    License(LicenseKey),
    Order(OrderSubmission),
}

/// Scripted stand-in for the remote Freeplotter API.
///
/// Queued question and showing replies are returned in order; once a queue is
/// empty a canned reply is used instead.
pub struct ScriptedRemote {
    questions: Mutex<VecDeque<PortResult<String>>>,
    showings: Mutex<VecDeque<PortResult<String>>>,
    outline: Mutex<Option<PortResult<GeneratedOutline>>>,
    license_verdicts: Mutex<VecDeque<PortResult<bool>>>,
    license_verdict: Mutex<PortResult<bool>>,
    order: Mutex<PortResult<OrderReceipt>>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl Default for ScriptedRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self {
            questions: Mutex::new(VecDeque::new()),
            showings: Mutex::new(VecDeque::new()),
            outline: Mutex::new(None),
            license_verdicts: Mutex::new(VecDeque::new()),
            license_verdict: Mutex::new(Ok(true)),
            order: Mutex::new(Ok(OrderReceipt {
                license_key: "FP-TEST-0001".to_string(),
                start_date: "2024-01-01T00:00:00Z".to_string(),
                end_date: "2024-02-01T00:00:00Z".to_string(),
            })),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_question(self, reply: PortResult<String>) -> Self {
        if let Ok(mut queue) = self.questions.lock() {
            queue.push_back(reply);
        }
        self
    }

    pub fn queue_showing(self, reply: PortResult<String>) -> Self {
        if let Ok(mut queue) = self.showings.lock() {
            queue.push_back(reply);
        }
        self
    }

    pub fn with_outline(self, reply: PortResult<GeneratedOutline>) -> Self {
        if let Ok(mut slot) = self.outline.lock() {
            *slot = Some(reply);
        }
        self
    }

    pub fn with_license_verdict(self, verdict: PortResult<bool>) -> Self {
        if let Ok(mut slot) = self.license_verdict.lock() {
            *slot = verdict;
        }
        self
    }

    /// Queues a one-off verdict, used before the standing one.
    pub fn queue_license_verdict(self, verdict: PortResult<bool>) -> Self {
        if let Ok(mut queue) = self.license_verdicts.lock() {
            queue.push_back(verdict);
        }
        self
    }

    pub fn with_order(self, reply: PortResult<OrderReceipt>) -> Self {
        if let Ok(mut slot) = self.order.lock() {
            *slot = reply;
        }
        self
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: RemoteCall) -> PortResult<()> {
        self.calls.lock().map_err(poisoned)?.push(call);
        Ok(())
    }
}

#[async_trait]
impl PromptService for ScriptedRemote {
    async fn next_question(&self, request: &QuestionRequest) -> PortResult<String> {
        self.record(RemoteCall::Question(request.clone()))?;
        let queued = self.questions.lock().map_err(poisoned)?.pop_front();
        queued.unwrap_or_else(|| Ok("What happens next in your story?".to_string()))
    }
}

#[async_trait]
impl ShowingService for ScriptedRemote {
    async fn show_dont_tell(&self, request: &ShowingRequest) -> PortResult<String> {
        self.record(RemoteCall::Showing(request.clone()))?;
        let queued = self.showings.lock().map_err(poisoned)?.pop_front();
        queued.unwrap_or_else(|| Ok(format!("Shown: {}", request.paragraph)))
    }
}

#[async_trait]
impl OutlineService for ScriptedRemote {
    async fn generate_outline(&self, request: &OutlineRequest) -> PortResult<GeneratedOutline> {
        self.record(RemoteCall::Outline(request.clone()))?;
        let scripted = self.outline.lock().map_err(poisoned)?.clone();
        scripted.unwrap_or_else(|| {
            Ok(GeneratedOutline {
                premise: format!("A {} tale called {}.", request.genre, request.title),
                outline: request
                    .plots
                    .iter()
                    .enumerate()
                    .map(|(n, plot)| OutlineSection {
                        title: format!("Chapter {}", n + 1),
                        content: plot.clone(),
                    })
                    .collect(),
            })
        })
    }
}

#[async_trait]
impl LicenseService for ScriptedRemote {
    async fn validate_license(&self, key: &LicenseKey) -> PortResult<bool> {
        self.record(RemoteCall::License(key.clone()))?;
        let queued = self.license_verdicts.lock().map_err(poisoned)?.pop_front();
        match queued {
            Some(verdict) => verdict,
            None => self.license_verdict.lock().map_err(poisoned)?.clone(),
        }
    }
}

#[async_trait]
impl OrderService for ScriptedRemote {
    async fn submit_order(&self, order: &OrderSubmission) -> PortResult<OrderReceipt> {
        self.record(RemoteCall::Order(order.clone()))?;
        self.order.lock().map_err(poisoned)?.clone()
    }
}

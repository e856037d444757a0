//! services/studio/src/adapters/openai_prompt.rs
//!
//! An alternative `PromptService` that asks an OpenAI chat model directly
//! instead of going through the Freeplotter API. Used when an OpenAI key is
//! configured.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use freeplotter_core::{
    domain::QuestionRequest,
    ports::{PortError, PortResult, PromptService},
};

pub const DEFAULT_QUESTION: &str = "What happens next in your story?";

const SYSTEM_INSTRUCTIONS: &str = r#"You are a creative writing assistant. Analyze the input text carefully and respond in the SAME LANGUAGE as the INPUT. Your primary role is to help writers deepen their narrative by asking one specific and engaging question that encourages further story development.

Story elements to consider:
- Tension and conflict: unresolved issues or challenges, internal or external.
- Character development: motivations, emotions and relationships.
- Setting and atmosphere: details of the environment.
- Stakes and risks: what is at stake and why it matters.
- Pacing and sequence: timing or order of events.
- Show, don't tell: opportunities to make descriptions more vivid.

Question guidelines:
- Generate ONE concise question based on the input.
- Begin the question with WHAT, WHEN, WHERE, WHO, WHY or HOW.
- Keep the question specific and directly related to the story's current moment.

Reply with the question only, in the same language as the input."#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PromptService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiPromptAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiPromptAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

fn user_prompt(request: &QuestionRequest) -> String {
    let mut prompt = String::new();
    if let Some(earlier) = &request.paragraph {
        prompt.push_str(&format!("Story so far:\n\"{}\"\n\n", earlier));
    }
    prompt.push_str(&format!(
        "Based on: \"{}\"\n\n\
         Consider:\n\
         1. What's happening in this moment?\n\
         2. What details could enrich the scene?\n\
         3. What's the immediate tension or conflict?\n\n\
         Generate ONE specific question starting with what/when/where/who/why/how \
         that will naturally lead to the next sentence.",
        request.sentences
    ));
    prompt
}

//=========================================================================================
// `PromptService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PromptService for OpenAiPromptAdapter {
    async fn next_question(&self, request: &QuestionRequest) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt(request))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(100u32)
            .temperature(0.7)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::Transport(e.to_string()))?;

        let question = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| DEFAULT_QUESTION.to_string());
        Ok(question)
    }
}

//! 生成 AI を使った QuestionSource 実装
//!
//! OpenAI 互換の chat completions エンドポイントに問題生成を依頼し、
//! 返ってきた completion テキストから問題の JSON 配列を取り出す。
//! 応答の解釈（`parse_generated_questions`）は純粋関数として分離してあり、
//! HTTP を介さずに単体テストできる。
//!
//! カテゴリ指定に `GENERATED_CATEGORY` マーカーが含まれるリクエストを
//! この実装へ振り分けるのは `RoutingQuestionSource` の役割。

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{PortError, Question, QuestionSource};

use super::collaborators::DEFAULT_QUESTION_COUNT;

/// 出題カテゴリとしてこの ID が指定されたら、問題バンクではなく
/// 生成 AI ソースへ振り分ける
pub const GENERATED_CATEGORY: &str = "generated";

/// 生成した問題に time_limit が付いていなかった場合の既定値（秒）
const DEFAULT_GENERATED_TIME_LIMIT: i64 = 30;

/// chat completions へ渡す temperature
const COMPLETION_TEMPERATURE: f32 = 0.8;

/// 生成 AI エンドポイントの接続設定
#[derive(Debug, Clone)]
pub struct GenerativeConfig {
    /// OpenAI 互換 API のベース URL（例: `https://api.example.com/v1`）
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl GenerativeConfig {
    /// 既定のモデル名
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash-lite";
}

/// OpenAI 互換 chat completions を使う QuestionSource 実装
///
/// `get_questions` の `category_ids` は生成テーマとして扱う
/// （空の場合は一般常識問題を依頼する）。
pub struct GenerativeQuestionSource {
    client: reqwest::Client,
    config: GenerativeConfig,
}

impl GenerativeQuestionSource {
    /// 新しい GenerativeQuestionSource を作成
    pub fn new(config: GenerativeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl QuestionSource for GenerativeQuestionSource {
    async fn get_questions(
        &self,
        count: usize,
        category_ids: &[String],
    ) -> Result<Vec<Question>, PortError> {
        let count = if count == 0 {
            DEFAULT_QUESTION_COUNT
        } else {
            count
        };
        let prompt = build_prompt(count, category_ids);
        tracing::info!(
            "Requesting {} generated questions from model '{}'",
            count,
            self.config.model
        );

        let url = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: COMPLETION_TEMPERATURE,
        };
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PortError::Unavailable(format!("chat completion request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(PortError::Unavailable(format!(
                "chat completion returned status {}",
                response.status()
            )));
        }
        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| PortError::InvalidResponse(format!("malformed completion body: {e}")))?;
        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| PortError::InvalidResponse("completion has no choices".to_string()))?;

        let mut questions = parse_generated_questions(content)?;
        questions.truncate(count);
        Ok(questions)
    }
}

/// 問題バンクと生成 AI ソースを使い分ける QuestionSource
///
/// `category_ids` に `GENERATED_CATEGORY` が含まれる場合は残りの
/// カテゴリを生成テーマとして生成ソースへ、それ以外は問題バンクへ委譲する。
pub struct RoutingQuestionSource {
    bank: Arc<dyn QuestionSource>,
    generative: Arc<dyn QuestionSource>,
}

impl RoutingQuestionSource {
    /// 新しい RoutingQuestionSource を作成
    pub fn new(bank: Arc<dyn QuestionSource>, generative: Arc<dyn QuestionSource>) -> Self {
        Self { bank, generative }
    }
}

#[async_trait]
impl QuestionSource for RoutingQuestionSource {
    async fn get_questions(
        &self,
        count: usize,
        category_ids: &[String],
    ) -> Result<Vec<Question>, PortError> {
        if category_ids
            .iter()
            .any(|c| c.as_str() == GENERATED_CATEGORY)
        {
            let topics: Vec<String> = category_ids
                .iter()
                .filter(|c| c.as_str() != GENERATED_CATEGORY)
                .cloned()
                .collect();
            self.generative.get_questions(count, &topics).await
        } else {
            self.bank.get_questions(count, category_ids).await
        }
    }
}

/// 問題生成の依頼プロンプトを組み立てる
fn build_prompt(count: usize, topics: &[String]) -> String {
    let theme = if topics.is_empty() {
        "general knowledge".to_string()
    } else {
        topics.join(", ")
    };
    format!(
        "Generate {count} multiple-choice quiz questions about {theme}. \
         Respond with a JSON array only, no prose and no code fences. \
         Each element must be an object with keys \"text\" (the question), \
         \"options\" (an array of 4 answer strings), \"correct_answer\" \
         (exactly one of the options) and \"time_limit\" (seconds, an integer)."
    )
}

/// completion テキストから問題リストを取り出す（純粋関数）
///
/// モデルがコードフェンスや前置きを付けてくることがあるため、
/// テキスト中の最初の JSON 配列を切り出してから解釈する。
/// 正解が選択肢に含まれない問題は応答全体を不正として扱う。
pub fn parse_generated_questions(content: &str) -> Result<Vec<Question>, PortError> {
    let payload = extract_json_array(content)
        .ok_or_else(|| PortError::InvalidResponse("no JSON array in completion".to_string()))?;
    let raw: Vec<GeneratedQuestion> = serde_json::from_str(payload)
        .map_err(|e| PortError::InvalidResponse(format!("malformed question payload: {e}")))?;

    let mut questions = Vec::with_capacity(raw.len());
    for (index, generated) in raw.into_iter().enumerate() {
        if generated.options.len() < 2 {
            return Err(PortError::InvalidResponse(format!(
                "generated question {} has fewer than 2 options",
                index + 1
            )));
        }
        if !generated.options.contains(&generated.correct_answer) {
            return Err(PortError::InvalidResponse(format!(
                "generated question {} has no matching correct answer",
                index + 1
            )));
        }
        questions.push(Question {
            id: format!("gen-{}", index + 1),
            text: generated.text,
            options: generated.options,
            correct_answer: generated.correct_answer,
            time_limit: generated.time_limit,
            category_id: Some(GENERATED_CATEGORY.to_string()),
        });
    }
    Ok(questions)
}

/// テキスト中の最初の `[` から最後の `]` までを切り出す
fn extract_json_array(content: &str) -> Option<&str> {
    let start = content.find('[')?;
    let end = content.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&content[start..=end])
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct GeneratedQuestion {
    text: String,
    options: Vec<String>,
    correct_answer: String,
    #[serde(default = "default_generated_time_limit")]
    time_limit: i64,
}

fn default_generated_time_limit() -> i64 {
    DEFAULT_GENERATED_TIME_LIMIT
}

//! Route handlers.

use super::error::{public_message, ApiError};
use super::state::AppContext;
use axum::extract::rejection::JsonRejection;
use axum::extract::{RawQuery, State};
use axum::Json;
use medbot_core::AppError;
use medbot_knowledge::ConversationTurn;
use serde::{Deserialize, Serialize};

pub const EMPTY_QUESTION: &str = "Question cannot be empty.";
pub const EMPTY_QUESTION_LIST: &str = "Questions list cannot be empty.";

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub pinecone_index: String,
    pub model_ready: bool,
}

pub async fn root() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: "Medical Chatbot API is running.".to_string(),
    })
}

pub async fn health(State(context): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        pinecone_index: context.index_name().to_string(),
        model_ready: context.is_ready(),
    })
}

/// `POST /ask/`
pub async fn ask(
    State(context): State<AppContext>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<ConversationTurn>, ApiError> {
    let generator = context.generator()?;
    let Json(request) = payload?;

    let question = request.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation(EMPTY_QUESTION.to_string()).into());
    }

    tracing::debug!("Answering question: {}", question);
    let turn = generator.answer(question).await?;
    Ok(Json(turn))
}

/// `GET /questions/?questions=a&questions=b`
///
/// Questions are answered one after another in the order given. A failure
/// for one question is reported inline and does not affect the others.
pub async fn questions(
    State(context): State<AppContext>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<ConversationTurn>>, ApiError> {
    let generator = context.generator()?;

    let questions = parse_questions(query.as_deref());
    if questions.is_empty() {
        return Err(AppError::Validation(EMPTY_QUESTION_LIST.to_string()).into());
    }

    let mut turns = Vec::with_capacity(questions.len());
    for raw in questions {
        let question = raw.trim();
        if question.is_empty() {
            turns.push(ConversationTurn {
                question: raw,
                answer: format!("Error: {}", EMPTY_QUESTION),
            });
            continue;
        }

        match generator.answer(question).await {
            Ok(turn) => turns.push(turn),
            Err(e) => {
                tracing::error!("Failed to answer '{}': {}", question, e);
                turns.push(ConversationTurn {
                    question: question.to_string(),
                    answer: format!("Error: {}", public_message(&e)),
                });
            }
        }
    }

    Ok(Json(turns))
}

/// Collect every `questions` value from a query string, keeping order.
pub fn parse_questions(query: Option<&str>) -> Vec<String> {
    let Some(query) = query else {
        return Vec::new();
    };

    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == "questions")
        .map(|(_, value)| value.into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_questions_keeps_order() {
        let parsed = parse_questions(Some("questions=What+is+acne%3F&other=1&questions=gout"));
        assert_eq!(parsed, vec!["What is acne?", "gout"]);
    }

    #[test]
    fn test_parse_questions_empty() {
        assert!(parse_questions(None).is_empty());
        assert!(parse_questions(Some("")).is_empty());
        assert!(parse_questions(Some("other=1")).is_empty());
        assert_eq!(parse_questions(Some("questions=")), vec![""]);
    }
}

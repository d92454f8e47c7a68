use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assistant::catalog::AssistantFunctionCatalog;
use crate::assistant::dispatch::{dispatch_at, DispatchOutcome, ModelDecision};
use crate::error::DrawServicingError;
use crate::ports::{PortResult, QueryPort};
use crate::DrawServicingResult;

pub const SYSTEM_PROMPT: &str = "You are a back-office assistant for construction-loan draw \
servicing. Answer questions about loans, draw requests, lien waivers and project risk. \
When the answer needs data, call exactly one of the provided functions instead of guessing.";

/// Hosted language model that decides whether to call a function.
#[cfg_attr(test, mockall::automock)]
pub trait AssistantModelPort {
    fn complete(
        &self,
        system_prompt: &str,
        question: &str,
        catalog: &AssistantFunctionCatalog,
    ) -> PortResult<ModelDecision>;
}

/// Reply merged into the caller's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Ask the model, run the function it picks (if any) and assemble the reply.
pub fn answer_question<M, Q>(
    model: &M,
    catalog: &AssistantFunctionCatalog,
    query: &Q,
    question: &str,
) -> DrawServicingResult<AssistantReply>
where
    M: AssistantModelPort + ?Sized,
    Q: QueryPort + ?Sized,
{
    answer_question_at(model, catalog, query, question, Utc::now())
}

pub fn answer_question_at<M, Q>(
    model: &M,
    catalog: &AssistantFunctionCatalog,
    query: &Q,
    question: &str,
    as_of: DateTime<Utc>,
) -> DrawServicingResult<AssistantReply>
where
    M: AssistantModelPort + ?Sized,
    Q: QueryPort + ?Sized,
{
    let question = question.trim();
    if question.is_empty() {
        return Err(DrawServicingError::InvalidInput {
            field: "question".into(),
            reason: "Question cannot be empty".into(),
        });
    }

    let decision = model.complete(SYSTEM_PROMPT, question, catalog)?;
    let message = decision.message.clone();

    let reply = match dispatch_at(&decision, catalog, query, as_of)? {
        DispatchOutcome::DirectReply { message } => AssistantReply {
            message,
            function: None,
            data: None,
        },
        DispatchOutcome::Dispatched {
            function,
            result_payload,
        } => AssistantReply {
            message,
            function: Some(function.name().to_string()),
            data: Some(result_payload),
        },
    };
    Ok(reply)
}

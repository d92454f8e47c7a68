//! Assistant function dispatch.
//!
//! A hosted model answers a user question either directly or by naming one
//! of the functions in the [`catalog::AssistantFunctionCatalog`]. The
//! dispatcher validates that choice against the catalog, runs the matching
//! read on a [`crate::ports::QueryPort`] and returns the payload.

pub mod aggregate;
pub mod catalog;
pub mod dispatch;
pub mod function;
pub mod session;

pub use catalog::{AssistantFunctionCatalog, FunctionSpec, ParamType, ParameterSpec};
pub use dispatch::{dispatch, dispatch_at, DispatchOutcome, FunctionCall, ModelDecision, TurnState};
pub use function::{AssistantFunction, FunctionInvocation};
pub use session::{answer_question, AssistantModelPort, AssistantReply};

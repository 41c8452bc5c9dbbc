//! Profile extraction from executor actions.

use crate::types::{ExecutorAction, ExecutorActionType, ProfileVariant};

/// Profile the action was launched with.
///
/// Only the two interactive coding-agent requests carry one; scripts and
/// unrecognized actions yield `None`.
pub fn extract_profile(action: &ExecutorAction) -> Option<ProfileVariant> {
    match &action.typ {
        ExecutorActionType::CodingAgentInitialRequest(req) => Some(req.profile.clone()),
        ExecutorActionType::CodingAgentFollowUpRequest(req) => Some(req.profile.clone()),
        ExecutorActionType::ScriptRequest(_) | ExecutorActionType::Unknown => None,
    }
}

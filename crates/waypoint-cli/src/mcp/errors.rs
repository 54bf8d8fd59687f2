//! Error handling utilities for MCP server

use rmcp::ErrorData;
use waypoint_core::PlannerError;

/// Converts a planner error into an MCP error.
///
/// Caller mistakes (bad ids, illegal moves, an uninitialized project) map to
/// `invalid_params` so the agent can correct the call; everything else is an
/// internal error.
pub fn to_mcp_error(message: &str, error: &PlannerError) -> ErrorData {
    let text = format!("{message}: {error}");
    match error {
        PlannerError::UnknownTask { .. }
        | PlannerError::IllegalTransition { .. }
        | PlannerError::InvalidInput { .. }
        | PlannerError::StateNotFound { .. }
        | PlannerError::PhaseNotFound { .. }
        | PlannerError::PhaseIncomplete { .. }
        | PlannerError::NoNextPhase { .. } => ErrorData::invalid_params(text, None),
        _ => ErrorData::internal_error(text, None),
    }
}

#[cfg(test)]
mod tests {
    use rmcp::model::ErrorCode;

    use super::*;

    #[test]
    fn test_caller_errors_are_invalid_params() {
        let error = to_mcp_error(
            "Failed to start task",
            &PlannerError::UnknownTask {
                id: "phase9-task1".to_string(),
            },
        );
        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
        assert!(error.message.contains("phase9-task1"));

        let error = to_mcp_error(
            "Failed to load",
            &PlannerError::Configuration {
                message: "join".to_string(),
            },
        );
        assert_eq!(error.code, ErrorCode::INTERNAL_ERROR);
    }
}

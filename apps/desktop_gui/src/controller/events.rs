//! UI/backend events and error modeling for the desktop controller.

use shared::protocol::{PricingInfo, ProposalRecord, ServerEvent};

pub enum UiEvent {
    Connected { pricing: PricingInfo },
    Info(String),
    ProposalCreated(ProposalRecord),
    ProposalLoaded(ProposalRecord),
    AnswerRecorded(ProposalRecord),
    Server(ServerEvent),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    NotFound,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Connect,
    CreateProposal,
    LoadProposal,
    Answer,
}

pub fn classify_connect_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("backend worker startup failure")
        || lower.contains("failed to build backend runtime")
    {
        "Backend worker startup failure; verify local app environment and retry.".to_string()
    } else if lower.contains("failed to connect")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        "Server unreachable; check URL/network and retry.".to_string()
    } else {
        format!("Connection error: {message}")
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("not found") || message_lower.contains("404") {
            UiErrorCategory::NotFound
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("empty")
            || message_lower.contains("exceeds")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("transport")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_proposals_classify_as_not_found() {
        let err = UiError::from_message(UiErrorContext::LoadProposal, "proposal not found");
        assert_eq!(err.category(), UiErrorCategory::NotFound);
    }

    #[test]
    fn unreachable_servers_classify_as_transport() {
        let err = UiError::from_message(UiErrorContext::Connect, "connection refused");
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert_eq!(
            classify_connect_failure("error sending request: connection refused"),
            "Server unreachable; check URL/network and retry."
        );
    }

    #[test]
    fn blank_names_classify_as_validation() {
        let err = UiError::from_message(
            UiErrorContext::CreateProposal,
            "valentine_name cannot be empty",
        );
        assert_eq!(err.category(), UiErrorCategory::Validation);
    }
}

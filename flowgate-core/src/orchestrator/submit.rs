//! The submit pipeline

use std::time::Instant;

use crate::classifier::{classify, OperationKind};
use crate::collaborator::{ChatReply, ChatTurn};
use crate::events::FlowEvent;
use crate::sequencer::{FlowOutcome, FlowStage};
use crate::session::ChatMessage;
use crate::tokens::ExchangeResult;

use super::{BusyGuard, Orchestrator, SubmitReport};

impl Orchestrator {
    /// Submit a user message
    ///
    /// Appends the user message, resets the flow and starts pacing it while
    /// the collaborator is called, then asserts the terminal flow outcome
    /// and appends the assistant reply. Collaborator failures become an
    /// assistant message and a failed flow, so this never returns an error.
    ///
    /// Concurrent submits are not serialized: each one restarts the flow and
    /// the last terminal start wins.
    pub async fn submit(&self, text: &str) -> SubmitReport {
        let started = Instant::now();
        let _busy = BusyGuard::new(&self.in_flight);

        let kind = classify(text);
        self.emit_event(FlowEvent::SubmitStarted {
            text: text.to_string(),
            kind,
            timestamp: started,
        });

        let user_message = ChatMessage::user(text);
        let (epoch, turn) = {
            let mut session = self.session.write();
            session.append(user_message.clone());
            let turn = ChatTurn {
                message: text.to_string(),
                conversation_id: session.conversation_id().map(str::to_string),
                identity_token: session.identity_token().map(str::to_string),
            };
            (session.epoch(), turn)
        };
        self.emit_event(FlowEvent::MessageAppended {
            message: user_message,
        });

        // Cosmetic pacing while the call is outstanding; the terminal start
        // below decides the final step states.
        let preview_label = kind.tool_label();
        self.sequencer.reset();
        self.sequencer.start(FlowOutcome::Success, preview_label);

        let with_identity = turn.identity_token.is_some();
        self.emit_event(FlowEvent::CollaboratorCallStarted {
            collaborator: self.collaborator.name().to_string(),
            with_identity,
        });

        let call_started = Instant::now();
        let result = self.collaborator.send(turn).await;

        let report = match result {
            Ok(reply) => {
                self.emit_event(FlowEvent::CollaboratorCallCompleted {
                    token_exchanged: reply.exchange_performed(),
                    tool_calls: reply.tool_calls.len(),
                    duration: call_started.elapsed(),
                });
                self.complete(reply, epoch, kind, preview_label, with_identity)
            }
            Err(err) => {
                log::warn!("collaborator call failed: {}", err);
                self.emit_event(FlowEvent::CollaboratorCallFailed {
                    error: err.to_string(),
                    duration: call_started.elapsed(),
                });

                let outcome = FlowOutcome::failure(if with_identity {
                    FlowStage::Delegation
                } else {
                    FlowStage::Identity
                });
                let generation = self.sequencer.start(outcome, preview_label);
                self.append_reply(epoch, err.user_message());

                SubmitReport {
                    kind,
                    tool_label: preview_label.to_string(),
                    outcome,
                    generation,
                    exchange_performed: false,
                    error: Some(err.to_string()),
                }
            }
        };

        self.emit_event(FlowEvent::SubmitCompleted {
            outcome: report.outcome,
            duration: started.elapsed(),
        });
        report
    }

    fn complete(
        &self,
        reply: ChatReply,
        epoch: u64,
        kind: OperationKind,
        preview_label: &str,
        with_identity: bool,
    ) -> SubmitReport {
        let outcome = assess(&reply, with_identity);
        let exchange_performed = reply.exchange_performed();
        let tool_label = reply.first_tool().unwrap_or(preview_label).to_string();

        let exchange = match &reply.exchange {
            Some(exchange) if exchange_performed => exchange.clone(),
            _ => ExchangeResult::none(),
        };

        let merged = {
            let mut session = self.session.write();
            if session.epoch() == epoch {
                session.apply_exchange_result(exchange);
                session.set_conversation_id(reply.conversation_id.clone());
                session.tokens()
            } else {
                None
            }
        };
        match merged {
            Some(bundle) => self.emit_event(FlowEvent::TokensUpdated {
                has_delegation: bundle.delegation.is_some(),
                has_access: bundle.access.is_some(),
            }),
            None => log::debug!("session changed during submit, tokens not merged"),
        }

        let generation = self.sequencer.start(outcome, &tool_label);
        self.append_reply(epoch, reply.text);

        SubmitReport {
            kind,
            tool_label,
            outcome,
            generation,
            exchange_performed,
            error: None,
        }
    }

    /// Append an assistant message unless the session was replaced meanwhile
    fn append_reply(&self, epoch: u64, text: String) {
        let message = ChatMessage::assistant(text);
        let appended = {
            let mut session = self.session.write();
            if session.epoch() == epoch {
                session.append(message.clone());
                true
            } else {
                false
            }
        };

        if appended {
            self.emit_event(FlowEvent::MessageAppended { message });
        } else {
            log::debug!("session changed during submit, reply dropped");
        }
    }
}

/// Where, if anywhere, the chain broke according to a collaborator reply.
pub(crate) fn assess(reply: &ChatReply, with_identity: bool) -> FlowOutcome {
    if !reply.exchange_performed() {
        let stage = if with_identity {
            FlowStage::Delegation
        } else {
            FlowStage::Identity
        };
        return FlowOutcome::failure(stage);
    }

    let granted = reply.exchange.as_ref().is_some_and(|exchange| {
        let present = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());
        present(&exchange.access_token) || present(&exchange.scope)
    });
    if !granted {
        return FlowOutcome::failure(FlowStage::AccessGrant);
    }

    if reply.access_denied || reply.tool_calls.iter().any(|call| call.status.is_blocked()) {
        return FlowOutcome::failure(FlowStage::ToolCall);
    }

    FlowOutcome::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::{ToolInvocation, ToolStatus};

    fn exchange() -> ExchangeResult {
        ExchangeResult {
            delegation_token: Some("h.p.s".to_string()),
            access_token: Some("at".to_string()),
            scope: Some("mcp:read".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_assess_success() {
        let reply = ChatReply::text("ok")
            .with_exchange(exchange())
            .with_tool_call(ToolInvocation::new("get_customer", ToolStatus::Completed));
        assert_eq!(assess(&reply, true), FlowOutcome::Success);
    }

    #[test]
    fn test_assess_no_exchange() {
        let reply = ChatReply::text("no");
        assert_eq!(assess(&reply, true), FlowOutcome::failure(FlowStage::Delegation));
        assert_eq!(assess(&reply, false), FlowOutcome::failure(FlowStage::Identity));

        let mut flagged_off = ChatReply::text("no").with_exchange(exchange());
        flagged_off.token_exchanged = false;
        assert_eq!(
            assess(&flagged_off, true),
            FlowOutcome::failure(FlowStage::Delegation)
        );
    }

    #[test]
    fn test_assess_missing_access_grant() {
        let reply = ChatReply::text("half").with_exchange(ExchangeResult {
            delegation_token: Some("h.p.s".to_string()),
            access_token: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(assess(&reply, true), FlowOutcome::failure(FlowStage::AccessGrant));
    }

    #[test]
    fn test_assess_scope_alone_counts_as_grant() {
        let reply = ChatReply::text("ok").with_exchange(ExchangeResult {
            delegation_token: Some("h.p.s".to_string()),
            scope: Some("mcp:read".to_string()),
            ..Default::default()
        });
        assert_eq!(assess(&reply, true), FlowOutcome::Success);
    }

    #[test]
    fn test_assess_tool_denials() {
        let denied = ChatReply::text("no").with_exchange(exchange()).denied();
        assert_eq!(assess(&denied, true), FlowOutcome::failure(FlowStage::ToolCall));

        let failed = ChatReply::text("no")
            .with_exchange(exchange())
            .with_tool_call(ToolInvocation::new("get_customer", ToolStatus::Failed));
        assert_eq!(assess(&failed, true), FlowOutcome::failure(FlowStage::ToolCall));
    }

    #[test]
    fn test_assess_approval_is_not_failure() {
        let reply = ChatReply::text("waiting")
            .with_exchange(exchange())
            .with_tool_call(ToolInvocation::new(
                "initiate_payment",
                ToolStatus::RequiresApproval,
            ));
        assert_eq!(assess(&reply, true), FlowOutcome::Success);
    }
}

//! FlowRunner – loads a session, records the user's turn in the transcript,
//! executes exactly **one** step, records the bot's reply, and persists the
//! session back to storage.
//!
//! Interactive services want one step per request: the user sends a message,
//! the bot answers, the session is saved for the next roundtrip. `FlowRunner`
//! makes that a one-liner and keeps transcript bookkeeping in one place.
//!
//! The optional typing delay emulates a human-ish response latency. It is a
//! presentation concern only: correctness never depends on it, and tests run
//! with the default of zero.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    context::Context,
    error::{FlowError, Result},
    flow::{Flow, StepOutcome},
    storage::SessionStorage,
};

/// Context key under which the runner places the raw user input of the
/// current turn.
pub const USER_INPUT_KEY: &str = "user_input";

/// High-level helper orchestrating the _load → transcribe → execute → save_
/// pattern.
#[derive(Clone)]
pub struct FlowRunner {
    flow: Arc<Flow>,
    storage: Arc<dyn SessionStorage>,
    typing_delay: Duration,
}

impl FlowRunner {
    pub fn new(flow: Arc<Flow>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            flow,
            storage,
            typing_delay: Duration::ZERO,
        }
    }

    /// Wait this long before appending a bot reply, emulating typing.
    pub fn with_typing_delay(mut self, delay: Duration) -> Self {
        self.typing_delay = delay;
        self
    }

    /// Execute one user turn for `session_id` and persist the updated session.
    ///
    /// The user message is always appended to the transcript. A bot message is
    /// appended only when the step actually replied; unrecognized input leaves
    /// the transcript with just the user turn (the silent no-op contract).
    pub async fn run_turn(&self, session_id: &str, user_input: &str) -> Result<StepOutcome> {
        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;

        session.transcript.push_user(user_input);
        session.context.set(USER_INPUT_KEY, user_input);

        let outcome = self.flow.execute_session(&mut session).await?;

        if let Some(reply) = &outcome.reply {
            if !self.typing_delay.is_zero() {
                tokio::time::sleep(self.typing_delay).await;
            }
            session
                .transcript
                .push_bot(reply.text.clone(), reply.quick_replies.clone());
        }

        self.storage.save(session).await?;
        Ok(outcome)
    }

    /// The context of a live session, for callers that need to seed values
    /// (e.g. the current user id) before a turn runs.
    pub async fn session_context(&self, session_id: &str) -> Result<Context> {
        let session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;
        Ok(session.context)
    }
}

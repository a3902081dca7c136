use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{context::Context, error::Result};

/// A bot reply: message text plus the quick-reply buttons offered with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default)]
    pub quick_replies: Vec<String>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quick_replies: Vec::new(),
        }
    }

    pub fn with_quick_replies<I, S>(text: impl Into<String>, quick_replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            text: text.into(),
            quick_replies: quick_replies.into_iter().map(Into::into).collect(),
        }
    }
}

/// Where the flow goes after a step handled one user turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NextStep {
    /// Stay on the current step and wait for more input.
    AwaitInput,
    /// Follow the outgoing edge to the next step.
    Advance,
    /// Jump to a specific step by id (loop-backs, sub-flows).
    GoTo(String),
    /// The conversation is finished.
    End,
}

/// Outcome of running one step for one user turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Reply to append to the transcript and send to the user. `None` means
    /// the input was not understood and is silently ignored.
    pub reply: Option<Reply>,
    pub next: NextStep,
    /// Which step produced this result; filled in by the flow.
    #[serde(default)]
    pub step_id: String,
}

impl StepResult {
    pub fn reply(reply: Reply, next: NextStep) -> Self {
        Self {
            reply: Some(reply),
            next,
            step_id: String::new(),
        }
    }

    /// No reply, no transition: unrecognized input is a no-op.
    pub fn ignore() -> Self {
        Self {
            reply: None,
            next: NextStep::AwaitInput,
            step_id: String::new(),
        }
    }
}

/// One state of the dialogue. Each user turn runs exactly one step.
#[async_trait]
pub trait Step: Send + Sync {
    /// Unique identifier for this step within a flow.
    fn id(&self) -> &str;

    async fn run(&self, context: Context) -> Result<StepResult>;
}

use serde::{Deserialize, Serialize};

use crate::{context::Context, transcript::Transcript};

/// One user's conversation: where they are in the flow, their shared context,
/// and the full message transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub flow_id: String,
    pub current_step_id: String,
    /// Step-to-step scratch state; not part of the serialized session view.
    #[serde(skip)]
    pub context: Context,
    pub transcript: Transcript,
}

impl Session {
    pub fn new_from_step(id: String, step_id: &str) -> Self {
        Self {
            id,
            flow_id: "default".to_string(),
            current_step_id: step_id.to_string(),
            context: Context::new(),
            transcript: Transcript::new(),
        }
    }
}

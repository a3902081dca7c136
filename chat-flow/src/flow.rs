use dashmap::DashMap;
use std::sync::{Arc, Mutex};

use crate::{
    context::Context,
    error::{FlowError, Result},
    session::Session,
    step::{NextStep, Reply, Step, StepResult},
};

/// Directed edge between two steps. `Advance` follows the first edge whose
/// `from` matches the current step.
#[derive(Debug, Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// A dialogue flow: a set of steps plus the edges between them.
pub struct Flow {
    pub id: String,
    steps: DashMap<String, Arc<dyn Step>>,
    edges: Mutex<Vec<Edge>>,
    start_step_id: Mutex<Option<String>>,
}

impl Flow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: DashMap::new(),
            edges: Mutex::new(Vec::new()),
            start_step_id: Mutex::new(None),
        }
    }

    /// Register a step. The first registered step becomes the start step.
    pub fn add_step(&self, step: Arc<dyn Step>) -> &Self {
        let step_id = step.id().to_string();
        let is_first = self.steps.is_empty();
        self.steps.insert(step_id.clone(), step);
        if is_first {
            *self.start_step_id.lock().expect("start step lock") = Some(step_id);
        }
        self
    }

    pub fn set_start_step(&self, step_id: impl Into<String>) -> &Self {
        let step_id = step_id.into();
        if self.steps.contains_key(&step_id) {
            *self.start_step_id.lock().expect("start step lock") = Some(step_id);
        }
        self
    }

    pub fn add_edge(&self, from: impl Into<String>, to: impl Into<String>) -> &Self {
        self.edges.lock().expect("edges lock").push(Edge {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    pub fn start_step_id(&self) -> Option<String> {
        self.start_step_id.lock().expect("start step lock").clone()
    }

    pub fn get_step(&self, step_id: &str) -> Option<Arc<dyn Step>> {
        self.steps.get(step_id).map(|entry| entry.clone())
    }

    /// Run the session's current step once and move the session according to
    /// the step's `NextStep`. Exactly one step executes per call; the caller
    /// owns transcript bookkeeping and persistence.
    pub async fn execute_session(&self, session: &mut Session) -> Result<StepOutcome> {
        let result = self
            .execute_single_step(&session.current_step_id, session.context.clone())
            .await?;

        match &result.next {
            NextStep::AwaitInput => {
                session.current_step_id = result.step_id.clone();
                Ok(StepOutcome {
                    reply: result.reply,
                    status: FlowStatus::WaitingForInput,
                })
            }
            NextStep::Advance => {
                session.current_step_id = self
                    .next_step_after(&result.step_id)
                    .unwrap_or_else(|| result.step_id.clone());
                Ok(StepOutcome {
                    reply: result.reply,
                    status: FlowStatus::WaitingForInput,
                })
            }
            NextStep::GoTo(target_id) => {
                if !self.steps.contains_key(target_id) {
                    return Err(FlowError::StepNotFound(target_id.clone()));
                }
                session.current_step_id = target_id.clone();
                Ok(StepOutcome {
                    reply: result.reply,
                    status: FlowStatus::WaitingForInput,
                })
            }
            NextStep::End => {
                session.current_step_id = result.step_id.clone();
                Ok(StepOutcome {
                    reply: result.reply,
                    status: FlowStatus::Completed,
                })
            }
        }
    }

    async fn execute_single_step(&self, step_id: &str, context: Context) -> Result<StepResult> {
        let step = self
            .steps
            .get(step_id)
            .ok_or_else(|| FlowError::StepNotFound(step_id.to_string()))?;

        let mut result = step.run(context).await?;
        result.step_id = step_id.to_string();
        Ok(result)
    }

    /// First outgoing edge wins.
    fn next_step_after(&self, current_step_id: &str) -> Option<String> {
        let edges = self.edges.lock().expect("edges lock");
        edges
            .iter()
            .find(|edge| edge.from == current_step_id)
            .map(|edge| edge.to.clone())
    }
}

/// Builder for assembling a [`Flow`].
pub struct FlowBuilder {
    flow: Flow,
}

impl FlowBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            flow: Flow::new(id),
        }
    }

    pub fn add_step(self, step: Arc<dyn Step>) -> Self {
        self.flow.add_step(step);
        self
    }

    pub fn add_edge(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.flow.add_edge(from, to);
        self
    }

    pub fn set_start_step(self, step_id: impl Into<String>) -> Self {
        self.flow.set_start_step(step_id);
        self
    }

    pub fn build(self) -> Flow {
        self.flow
    }
}

/// What one executed turn produced, as seen by the service layer.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub reply: Option<Reply>,
    pub status: FlowStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStatus {
    /// Waiting for the next user turn.
    WaitingForInput,
    /// The conversation reached its end.
    Completed,
}

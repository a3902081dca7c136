pub mod context;
pub mod error;
pub mod flow;
pub mod runner;
pub mod session;
pub mod step;
pub mod storage;
pub mod transcript;

// Re-export commonly used types
pub use context::Context;
pub use error::{FlowError, Result};
pub use flow::{Flow, FlowBuilder, FlowStatus, StepOutcome};
pub use runner::{FlowRunner, USER_INPUT_KEY};
pub use session::Session;
pub use step::{NextStep, Reply, Step, StepResult};
pub use storage::{FlowStorage, InMemoryFlowStorage, InMemorySessionStorage, SessionStorage};
pub use transcript::{ChatMessage, Sender, Transcript};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EchoStep {
        id: String,
    }

    #[async_trait]
    impl Step for EchoStep {
        fn id(&self) -> &str {
            &self.id
        }

        async fn run(&self, context: Context) -> Result<StepResult> {
            let input: String = context.get(USER_INPUT_KEY).unwrap_or_default();
            if input.is_empty() {
                return Ok(StepResult::ignore());
            }
            Ok(StepResult::reply(
                Reply::with_quick_replies(format!("echo: {input}"), ["again"]),
                NextStep::Advance,
            ))
        }
    }

    struct ByeStep;

    #[async_trait]
    impl Step for ByeStep {
        fn id(&self) -> &str {
            "bye"
        }

        async fn run(&self, _context: Context) -> Result<StepResult> {
            Ok(StepResult::reply(Reply::text("bye"), NextStep::End))
        }
    }

    fn two_step_flow() -> Arc<Flow> {
        Arc::new(
            FlowBuilder::new("test_flow")
                .add_step(Arc::new(EchoStep { id: "echo".into() }))
                .add_step(Arc::new(ByeStep))
                .add_edge("echo", "bye")
                .build(),
        )
    }

    #[tokio::test]
    async fn runner_executes_one_step_and_appends_transcript() {
        let flow = two_step_flow();
        let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        storage
            .save(Session::new_from_step("s1".into(), "echo"))
            .await
            .unwrap();

        let runner = FlowRunner::new(flow, storage.clone());
        let outcome = runner.run_turn("s1", "hello").await.unwrap();

        assert_eq!(outcome.status, FlowStatus::WaitingForInput);
        assert_eq!(outcome.reply.as_ref().unwrap().text, "echo: hello");

        let session = storage.get("s1").await.unwrap().unwrap();
        // user turn + bot reply
        assert_eq!(session.transcript.len(), 2);
        assert_eq!(session.transcript.messages()[0].sender, Sender::User);
        assert_eq!(session.transcript.messages()[1].sender, Sender::Bot);
        // Advance followed the echo -> bye edge
        assert_eq!(session.current_step_id, "bye");
    }

    #[tokio::test]
    async fn silent_step_appends_no_bot_message() {
        let flow = two_step_flow();
        let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        storage
            .save(Session::new_from_step("s2".into(), "echo"))
            .await
            .unwrap();

        let runner = FlowRunner::new(flow, storage.clone());
        let outcome = runner.run_turn("s2", "").await.unwrap();

        assert!(outcome.reply.is_none());
        let session = storage.get("s2").await.unwrap().unwrap();
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.current_step_id, "echo");
    }

    #[tokio::test]
    async fn end_step_completes_session() {
        let flow = two_step_flow();
        let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        storage
            .save(Session::new_from_step("s3".into(), "bye"))
            .await
            .unwrap();

        let runner = FlowRunner::new(flow, storage);
        let outcome = runner.run_turn("s3", "whatever").await.unwrap();
        assert_eq!(outcome.status, FlowStatus::Completed);
    }

    #[tokio::test]
    async fn storage_roundtrip() {
        let flow_storage = InMemoryFlowStorage::new();
        let session_storage = InMemorySessionStorage::new();

        let flow = Arc::new(Flow::new("test"));
        flow_storage
            .save("test".to_string(), flow.clone())
            .await
            .unwrap();
        assert!(flow_storage.get("test").await.unwrap().is_some());

        let session = Session::new_from_step("session1".into(), "greeting");
        session_storage.save(session).await.unwrap();
        let retrieved = session_storage.get("session1").await.unwrap().unwrap();
        assert_eq!(retrieved.current_step_id, "greeting");

        session_storage.delete("session1").await.unwrap();
        assert!(session_storage.get("session1").await.unwrap().is_none());
    }
}

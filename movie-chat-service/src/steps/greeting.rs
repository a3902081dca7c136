use async_trait::async_trait;
use chat_flow::{Context, NextStep, Reply, Step, StepResult, USER_INPUT_KEY};
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::CatalogSource;
use crate::genres::GENRES;
use crate::intent::{Intent, parse_intent};
use crate::recommend::popular_only;
use crate::steps::{
    CATALOG_ERROR, labels, render, session_keys, step_ids, watched_ids_for,
};
use crate::watched::WatchedStore;

/// Entry state. Starts the recommendation flow, serves the popular-only side
/// quest, or says goodbye. Everything else is silently ignored.
pub struct GreetingStep {
    catalog: Arc<dyn CatalogSource>,
    watched: Arc<dyn WatchedStore>,
}

impl GreetingStep {
    pub fn new(catalog: Arc<dyn CatalogSource>, watched: Arc<dyn WatchedStore>) -> Self {
        Self { catalog, watched }
    }
}

#[async_trait]
impl Step for GreetingStep {
    fn id(&self) -> &str {
        step_ids::GREETING
    }

    async fn run(&self, context: Context) -> chat_flow::Result<StepResult> {
        let input: String = context.get(USER_INPUT_KEY).unwrap_or_default();

        if input == labels::START_RECOMMEND || parse_intent(&input) == Intent::Start {
            context.set(session_keys::SELECTED_GENRES, Vec::<String>::new());
            return Ok(StepResult::reply(
                Reply::with_quick_replies(
                    "좋아요! 어떤 장르를 좋아하시나요? 😊\n여러 개 선택하셔도 됩니다!",
                    GENRES,
                ),
                NextStep::Advance,
            ));
        }

        if input == labels::SHOW_POPULAR {
            // side quest: render popular titles but stay in greeting
            let reply = match self.catalog.fetch().await {
                Ok(catalog) => {
                    let watched = watched_ids_for(&context, self.watched.as_ref()).await;
                    let popular = popular_only(&catalog, &watched);
                    info!(count = popular.len(), "rendering popular-only list");
                    Reply::with_quick_replies(
                        render::popular_block(&popular),
                        [labels::START_RECOMMEND],
                    )
                }
                Err(err) => {
                    warn!(error = %err, "catalog fetch failed in greeting");
                    Reply::text(CATALOG_ERROR)
                }
            };
            return Ok(StepResult::reply(reply, NextStep::AwaitInput));
        }

        if input == labels::NO {
            return Ok(StepResult::reply(
                Reply::text("알겠어요! 언제든 다시 찾아주세요 👋"),
                NextStep::End,
            ));
        }

        Ok(StepResult::ignore())
    }
}

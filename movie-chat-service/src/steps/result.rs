use async_trait::async_trait;
use chat_flow::{Context, NextStep, Reply, Step, StepResult, USER_INPUT_KEY};
use std::sync::Arc;
use tracing::warn;

use crate::catalog::CatalogSource;
use crate::filter::Filter;
use crate::genres::{GENRES, canonical};
use crate::intent::{Intent, parse_intent};
use crate::recommend::recommend;
use crate::steps::{
    CATALOG_ERROR, labels, render, session_keys, step_ids, watched_ids_for,
};
use crate::watched::WatchedStore;

/// Result state: either loop back to the greeting for another round, or open
/// the advanced-filter sub-flow, which re-runs the filter and re-renders the
/// result in place.
pub struct ResultStep {
    catalog: Arc<dyn CatalogSource>,
    watched: Arc<dyn WatchedStore>,
}

impl ResultStep {
    pub fn new(catalog: Arc<dyn CatalogSource>, watched: Arc<dyn WatchedStore>) -> Self {
        Self { catalog, watched }
    }

    async fn rerun_filter(&self, context: &Context, filter: &Filter) -> Reply {
        match self.catalog.fetch().await {
            Ok(catalog) => {
                let watched = watched_ids_for(context, self.watched.as_ref()).await;
                let result = recommend(filter, &catalog, &watched);
                context.set(session_keys::RECOMMENDATIONS, &result);
                Reply::with_quick_replies(
                    render::result_blocks(&result),
                    [labels::RETRY, labels::ADVANCED],
                )
            }
            Err(err) => {
                warn!(error = %err, "catalog fetch failed in result step");
                Reply::with_quick_replies(CATALOG_ERROR, [labels::RETRY, labels::ADVANCED])
            }
        }
    }
}

fn advanced_quick_replies() -> Vec<String> {
    GENRES
        .iter()
        .map(|g| g.to_string())
        .chain([
            labels::EXCLUDE_ADULT.to_string(),
            labels::APPLY.to_string(),
        ])
        .collect()
}

#[async_trait]
impl Step for ResultStep {
    fn id(&self) -> &str {
        step_ids::RESULT
    }

    async fn run(&self, context: Context) -> chat_flow::Result<StepResult> {
        let input: String = context.get(USER_INPUT_KEY).unwrap_or_default();
        let advanced: bool = context.get(session_keys::ADVANCED_MODE).unwrap_or(false);

        if advanced {
            let mut filter: Filter = context.get(session_keys::FILTER).unwrap_or_default();

            if input == labels::APPLY {
                context.set(session_keys::ADVANCED_MODE, false);
                let reply = self.rerun_filter(&context, &filter).await;
                return Ok(StepResult::reply(reply, NextStep::AwaitInput));
            }

            if input == labels::EXCLUDE_ADULT {
                filter.exclude_adult = !filter.exclude_adult;
                context.set(session_keys::FILTER, &filter);
                return Ok(StepResult::reply(
                    Reply::with_quick_replies(
                        render::advanced_filter_prompt(&filter),
                        advanced_quick_replies(),
                    ),
                    NextStep::AwaitInput,
                ));
            }

            let label = GENRES
                .iter()
                .copied()
                .find(|g| *g == input)
                .or(match parse_intent(&input) {
                    Intent::Genre(label) => Some(label),
                    _ => None,
                });
            if let Some(label) = label {
                if let Some(genre) = canonical(label) {
                    filter.toggle_genre(genre);
                    context.set(session_keys::FILTER, &filter);
                }
                return Ok(StepResult::reply(
                    Reply::with_quick_replies(
                        render::advanced_filter_prompt(&filter),
                        advanced_quick_replies(),
                    ),
                    NextStep::AwaitInput,
                ));
            }

            return Ok(StepResult::ignore());
        }

        if input.contains("다시") {
            // fresh round: drop the selection and the filter, back to greeting
            context.set(session_keys::SELECTED_GENRES, Vec::<String>::new());
            context.set(session_keys::FILTER, Filter::new());
            return Ok(StepResult::reply(
                Reply::with_quick_replies(
                    "다시 추천받으시겠어요? 😊",
                    [labels::YES, labels::NO],
                ),
                NextStep::GoTo(step_ids::GREETING.to_string()),
            ));
        }

        if input.contains("고급") {
            context.set(session_keys::ADVANCED_MODE, true);
            let filter: Filter = context.get(session_keys::FILTER).unwrap_or_default();
            return Ok(StepResult::reply(
                Reply::with_quick_replies(
                    render::advanced_filter_prompt(&filter),
                    advanced_quick_replies(),
                ),
                NextStep::AwaitInput,
            ));
        }

        Ok(StepResult::ignore())
    }
}

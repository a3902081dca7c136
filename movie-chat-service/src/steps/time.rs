use async_trait::async_trait;
use chat_flow::{Context, NextStep, Reply, Step, StepResult, USER_INPUT_KEY};
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::CatalogSource;
use crate::filter::{Filter, TimeChoice};
use crate::genres::canonical;
use crate::intent::{Intent, parse_intent};
use crate::recommend::recommend;
use crate::steps::{
    CATALOG_ERROR, labels, render, session_keys, step_ids, watched_ids_for,
};
use crate::watched::WatchedStore;

/// Time-budget selection. Accepting one of the four canonical options locks
/// the filter, runs the recommendation filter, and advances to the result
/// step with both lists rendered.
pub struct TimeStep {
    catalog: Arc<dyn CatalogSource>,
    watched: Arc<dyn WatchedStore>,
}

impl TimeStep {
    pub fn new(catalog: Arc<dyn CatalogSource>, watched: Arc<dyn WatchedStore>) -> Self {
        Self { catalog, watched }
    }
}

#[async_trait]
impl Step for TimeStep {
    fn id(&self) -> &str {
        step_ids::TIME
    }

    async fn run(&self, context: Context) -> chat_flow::Result<StepResult> {
        let input: String = context.get(USER_INPUT_KEY).unwrap_or_default();

        let choice = TimeChoice::from_label(&input).or(match parse_intent(&input) {
            Intent::Time(choice) => Some(choice),
            _ => None,
        });
        let Some(choice) = choice else {
            return Ok(StepResult::ignore());
        };

        let mut filter: Filter = context.get(session_keys::FILTER).unwrap_or_default();
        filter.set_time(choice.budget());

        let selected: Vec<String> = context
            .get(session_keys::SELECTED_GENRES)
            .unwrap_or_default();
        filter.set_genres(selected.iter().filter_map(|g| canonical(g)));
        context.set(session_keys::FILTER, &filter);

        info!(
            minutes = choice.budget().minutes(),
            genres = ?filter.genres(),
            "applying recommendation filter"
        );

        match self.catalog.fetch().await {
            Ok(catalog) => {
                let watched = watched_ids_for(&context, self.watched.as_ref()).await;
                let result = recommend(&filter, &catalog, &watched);
                context.set(session_keys::RECOMMENDATIONS, &result);
                Ok(StepResult::reply(
                    Reply::with_quick_replies(
                        render::result_blocks(&result),
                        [labels::RETRY, labels::ADVANCED],
                    ),
                    NextStep::Advance,
                ))
            }
            Err(err) => {
                warn!(error = %err, "catalog fetch failed in time step");
                // stay here so the user can simply pick a time again
                Ok(StepResult::reply(
                    Reply::with_quick_replies(CATALOG_ERROR, TimeChoice::labels()),
                    NextStep::AwaitInput,
                ))
            }
        }
    }
}

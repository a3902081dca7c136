//! The movie recommendation dialogue: greeting → genre → time → result, with
//! a loop back to greeting and an advanced-filter self-loop on result.

pub mod genre;
pub mod greeting;
pub mod render;
pub mod result;
pub mod time;

pub use genre::GenreStep;
pub use greeting::GreetingStep;
pub use result::ResultStep;
pub use time::TimeStep;

use chat_flow::{Context, Flow, FlowBuilder};
use std::collections::HashSet;
use std::sync::Arc;

use crate::catalog::CatalogSource;
use crate::watched::WatchedStore;

pub mod step_ids {
    pub const GREETING: &str = "greeting";
    pub const GENRE: &str = "genre";
    pub const TIME: &str = "time";
    pub const RESULT: &str = "result";
}

pub mod session_keys {
    pub const USER_ID: &str = "user_id";
    /// Korean display labels selected so far in the genre step.
    pub const SELECTED_GENRES: &str = "selected_genres";
    pub const FILTER: &str = "filter";
    pub const RECOMMENDATIONS: &str = "recommendations";
    pub const ADVANCED_MODE: &str = "advanced_mode";
}

/// Quick-reply button labels. Exact matches route before intent parsing.
pub mod labels {
    pub const START_RECOMMEND: &str = "영화 추천받기";
    pub const SHOW_POPULAR: &str = "인기 영화 보기";
    pub const DONE: &str = "완료";
    pub const RETRY: &str = "다시 추천받기";
    pub const ADVANCED: &str = "고급 필터";
    pub const APPLY: &str = "적용";
    pub const EXCLUDE_ADULT: &str = "성인 콘텐츠 제외";
    pub const YES: &str = "네";
    pub const NO: &str = "아니요";
}

/// Greeting shown when a session is created, before the first user turn.
pub const WELCOME: &str = "안녕하세요! 👋\n어떤 영화를 찾고 계세요?";

pub fn welcome_quick_replies() -> Vec<String> {
    vec![
        labels::START_RECOMMEND.to_string(),
        labels::SHOW_POPULAR.to_string(),
    ]
}

pub(crate) const CATALOG_ERROR: &str =
    "영화 목록을 불러오지 못했어요 😢 잠시 후 다시 시도해주세요.";

/// Watched ids of the session's user; sessions without a user have seen
/// nothing.
pub(crate) async fn watched_ids_for(ctx: &Context, store: &dyn WatchedStore) -> HashSet<i64> {
    match ctx.get::<u64>(session_keys::USER_ID) {
        Some(user_id) => store.watched_ids(user_id).await,
        None => HashSet::new(),
    }
}

/// Assemble the recommendation dialogue flow.
pub fn build_flow(
    catalog: Arc<dyn CatalogSource>,
    watched: Arc<dyn WatchedStore>,
) -> Flow {
    FlowBuilder::new("movie_recommendation")
        .add_step(Arc::new(GreetingStep::new(
            catalog.clone(),
            watched.clone(),
        )))
        .add_step(Arc::new(GenreStep))
        .add_step(Arc::new(TimeStep::new(catalog.clone(), watched.clone())))
        .add_step(Arc::new(ResultStep::new(catalog, watched)))
        .add_edge(step_ids::GREETING, step_ids::GENRE)
        .add_edge(step_ids::GENRE, step_ids::TIME)
        .add_edge(step_ids::TIME, step_ids::RESULT)
        .set_start_step(step_ids::GREETING)
        .build()
}

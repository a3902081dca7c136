//! End-to-end dialogue tests: drive the recommendation flow turn by turn the
//! way the HTTP handler does, with a fixed catalog and no typing delay.

use async_trait::async_trait;
use chat_flow::{FlowRunner, FlowStatus, InMemorySessionStorage, Session, SessionStorage};
use std::sync::Arc;

use movie_chat_service::catalog::{CatalogError, CatalogSource, Movie, StaticCatalog};
use movie_chat_service::recommend::RecommendationResult;
use movie_chat_service::steps::{build_flow, session_keys, step_ids};
use movie_chat_service::watched::{InMemoryWatchedStore, WatchRecord, WatchedStore};

fn movie(id: i64, title: &str, genres: &[&str], rating: f64, popularity: f64) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        year: None,
        rating: Some(rating),
        popularity: Some(popularity),
        poster: String::new(),
        description: String::new(),
        popular: false,
        watched: Some(false),
        adult: false,
    }
}

fn fixture_catalog() -> Vec<Movie> {
    vec![
        movie(1, "Blade Runner", &["Sci-Fi"], 9.0, 70.0),
        movie(2, "Arrival", &["Sci-Fi"], 8.0, 60.0),
        movie(3, "Moon", &["Sci-Fi"], 7.0, 30.0),
        movie(4, "Gattaca", &["Sci-Fi"], 6.0, 20.0),
        movie(5, "The Godfather", &["Crime", "Drama"], 9.5, 95.0),
        movie(6, "Parasite", &["Drama", "Thriller"], 9.2, 99.0),
        movie(7, "Up", &["Animation", "Family"], 8.5, 90.0),
        movie(8, "Heat", &["Action", "Crime"], 8.3, 50.0),
    ]
}

struct Harness {
    runner: FlowRunner,
    storage: Arc<dyn SessionStorage>,
}

impl Harness {
    async fn new_with_source(catalog: Arc<dyn CatalogSource>) -> Self {
        let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        let watched: Arc<dyn WatchedStore> = Arc::new(InMemoryWatchedStore::new());
        let flow = Arc::new(build_flow(catalog, watched));
        Self {
            runner: FlowRunner::new(flow, storage.clone()),
            storage,
        }
    }

    async fn new() -> Self {
        Self::new_with_source(Arc::new(StaticCatalog::from_movies(fixture_catalog()))).await
    }

    async fn start_session(&self, id: &str) {
        self.storage
            .save(Session::new_from_step(id.to_string(), step_ids::GREETING))
            .await
            .unwrap();
    }

    async fn session(&self, id: &str) -> Session {
        self.storage.get(id).await.unwrap().unwrap()
    }
}

#[tokio::test]
async fn free_text_start_moves_to_genre_prompt() {
    let h = Harness::new().await;
    h.start_session("s").await;

    let outcome = h.runner.run_turn("s", "영화 추천").await.unwrap();

    let reply = outcome.reply.unwrap();
    assert!(reply.text.contains("어떤 장르"));
    assert!(reply.quick_replies.contains(&"SF".to_string()));
    assert_eq!(h.session("s").await.current_step_id, step_ids::GENRE);
}

#[tokio::test]
async fn genre_toggle_twice_returns_to_empty_but_keeps_prompting() {
    let h = Harness::new().await;
    h.start_session("s").await;
    h.runner.run_turn("s", "영화 추천받기").await.unwrap();

    let first = h.runner.run_turn("s", "SF").await.unwrap().reply.unwrap();
    assert!(first.text.contains("현재 선택: SF"));

    let second = h.runner.run_turn("s", "SF").await.unwrap().reply.unwrap();
    assert!(second.text.contains("선택된 장르가 없어요"));
    assert!(second.quick_replies.contains(&"완료".to_string()));

    let session = h.session("s").await;
    let selected: Vec<String> = session.context.get(session_keys::SELECTED_GENRES).unwrap();
    assert!(selected.is_empty());
    assert_eq!(session.current_step_id, step_ids::GENRE);
}

#[tokio::test]
async fn completing_with_zero_genres_is_allowed() {
    let h = Harness::new().await;
    h.start_session("s").await;
    h.runner.run_turn("s", "영화 추천받기").await.unwrap();

    let outcome = h.runner.run_turn("s", "완료").await.unwrap();
    let reply = outcome.reply.unwrap();
    assert!(reply.text.contains("얼마나 시간"));
    assert!(reply.quick_replies.contains(&"상관없음".to_string()));
    assert_eq!(h.session("s").await.current_step_id, step_ids::TIME);
}

#[tokio::test]
async fn happy_path_renders_two_disjoint_lists() {
    let h = Harness::new().await;
    h.start_session("s").await;
    h.runner.run_turn("s", "영화 추천받기").await.unwrap();
    h.runner.run_turn("s", "SF").await.unwrap();
    h.runner.run_turn("s", "완료").await.unwrap();

    let outcome = h.runner.run_turn("s", "2시간").await.unwrap();
    let reply = outcome.reply.unwrap();
    assert!(reply.text.contains("🎯 맞춤 추천"));
    assert!(reply.text.contains("🔥 인기 영화"));
    assert!(reply.quick_replies.contains(&"다시 추천받기".to_string()));

    let session = h.session("s").await;
    assert_eq!(session.current_step_id, step_ids::RESULT);

    let result: RecommendationResult = session
        .context
        .get(session_keys::RECOMMENDATIONS)
        .unwrap();
    let titles: Vec<&str> = result.algorithmic.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, ["Blade Runner", "Arrival", "Moon"]);

    let algo_ids: Vec<i64> = result.algorithmic.iter().map(|m| m.id).collect();
    assert!(result.popular.iter().all(|m| !algo_ids.contains(&m.id)));
}

#[tokio::test]
async fn watched_movies_are_excluded_from_results() {
    let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
    let watched_store = Arc::new(InMemoryWatchedStore::new());
    watched_store
        .add(7, WatchRecord::now(1, Some(5.0)))
        .await
        .unwrap();

    let flow = Arc::new(build_flow(
        Arc::new(StaticCatalog::from_movies(fixture_catalog())),
        watched_store,
    ));
    let runner = FlowRunner::new(flow, storage.clone());

    let mut session = Session::new_from_step("s".to_string(), step_ids::GREETING);
    session.context.set(session_keys::USER_ID, 7u64);
    storage.save(session).await.unwrap();

    runner.run_turn("s", "영화 추천받기").await.unwrap();
    runner.run_turn("s", "SF").await.unwrap();
    runner.run_turn("s", "완료").await.unwrap();
    runner.run_turn("s", "1시간").await.unwrap();

    let session = storage.get("s").await.unwrap().unwrap();
    let result: RecommendationResult = session
        .context
        .get(session_keys::RECOMMENDATIONS)
        .unwrap();
    // Blade Runner (id 1) is already watched
    assert!(result.algorithmic.iter().all(|m| m.id != 1));
    assert!(result.popular.iter().all(|m| m.id != 1));
    let titles: Vec<&str> = result.algorithmic.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, ["Arrival", "Moon", "Gattaca"]);
}

#[tokio::test]
async fn retry_loops_back_to_greeting_and_clears_selection() {
    let h = Harness::new().await;
    h.start_session("s").await;
    h.runner.run_turn("s", "영화 추천받기").await.unwrap();
    h.runner.run_turn("s", "액션").await.unwrap();
    h.runner.run_turn("s", "완료").await.unwrap();
    h.runner.run_turn("s", "3시간").await.unwrap();

    let outcome = h.runner.run_turn("s", "다시 추천받기").await.unwrap();
    let reply = outcome.reply.unwrap();
    assert!(reply.text.contains("다시 추천받으시겠어요"));
    assert!(reply.quick_replies.contains(&"네".to_string()));

    let session = h.session("s").await;
    assert_eq!(session.current_step_id, step_ids::GREETING);
    let selected: Vec<String> = session.context.get(session_keys::SELECTED_GENRES).unwrap();
    assert!(selected.is_empty());
}

#[tokio::test]
async fn popular_only_side_quest_stays_in_greeting() {
    let h = Harness::new().await;
    h.start_session("s").await;

    let outcome = h.runner.run_turn("s", "인기 영화 보기").await.unwrap();
    let reply = outcome.reply.unwrap();
    assert!(reply.text.contains("🔥 인기 영화"));
    // popularity order: Parasite 99, The Godfather 95, Up 90
    assert!(reply.text.contains("1. Parasite"));
    assert!(reply.text.contains("2. The Godfather"));
    assert!(reply.text.contains("3. Up"));
    assert_eq!(h.session("s").await.current_step_id, step_ids::GREETING);
}

#[tokio::test]
async fn unknown_input_is_a_silent_no_op() {
    let h = Harness::new().await;
    h.start_session("s").await;

    let outcome = h.runner.run_turn("s", "qwerty").await.unwrap();
    assert!(outcome.reply.is_none());
    assert_eq!(outcome.status, FlowStatus::WaitingForInput);

    let session = h.session("s").await;
    // only the user's own message was appended
    assert_eq!(session.transcript.len(), 1);
    assert_eq!(session.current_step_id, step_ids::GREETING);
}

#[tokio::test]
async fn declining_ends_the_conversation() {
    let h = Harness::new().await;
    h.start_session("s").await;

    let outcome = h.runner.run_turn("s", "아니요").await.unwrap();
    assert_eq!(outcome.status, FlowStatus::Completed);
    assert!(outcome.reply.unwrap().text.contains("언제든"));
}

#[tokio::test]
async fn advanced_filter_rebuilds_result_in_place() {
    let h = Harness::new().await;
    h.start_session("s").await;
    h.runner.run_turn("s", "영화 추천받기").await.unwrap();
    h.runner.run_turn("s", "SF").await.unwrap();
    h.runner.run_turn("s", "완료").await.unwrap();
    h.runner.run_turn("s", "2시간").await.unwrap();

    let prompt = h
        .runner
        .run_turn("s", "고급 필터")
        .await
        .unwrap()
        .reply
        .unwrap();
    assert!(prompt.text.contains("고급 필터"));
    assert!(prompt.text.contains("현재 장르: Sci-Fi"));
    assert!(prompt.quick_replies.contains(&"적용".to_string()));

    let toggled = h
        .runner
        .run_turn("s", "성인 콘텐츠 제외")
        .await
        .unwrap()
        .reply
        .unwrap();
    assert!(toggled.text.contains("성인 콘텐츠 제외: 켜짐"));

    // widen the genre set, then apply
    h.runner.run_turn("s", "드라마").await.unwrap();
    let applied = h.runner.run_turn("s", "적용").await.unwrap().reply.unwrap();
    assert!(applied.text.contains("🎯 맞춤 추천"));
    assert_eq!(h.session("s").await.current_step_id, step_ids::RESULT);
}

struct FailingCatalog;

#[async_trait]
impl CatalogSource for FailingCatalog {
    async fn fetch(&self) -> Result<Vec<Movie>, CatalogError> {
        Err(CatalogError::Io(std::io::Error::other("backend down")))
    }
}

#[tokio::test]
async fn catalog_failure_shows_error_and_stays_interactive() {
    let h = Harness::new_with_source(Arc::new(FailingCatalog)).await;
    h.start_session("s").await;
    h.runner.run_turn("s", "영화 추천받기").await.unwrap();
    h.runner.run_turn("s", "완료").await.unwrap();

    let outcome = h.runner.run_turn("s", "1시간").await.unwrap();
    let reply = outcome.reply.unwrap();
    assert!(reply.text.contains("불러오지 못했어요"));
    assert_eq!(outcome.status, FlowStatus::WaitingForInput);

    // still in the time step, so choosing a time again retries the fetch
    assert_eq!(h.session("s").await.current_step_id, step_ids::TIME);
    assert!(reply.quick_replies.contains(&"1시간".to_string()));
}

#[tokio::test]
async fn empty_catalog_renders_placeholders_not_errors() {
    let h = Harness::new_with_source(Arc::new(StaticCatalog::empty())).await;
    h.start_session("s").await;
    h.runner.run_turn("s", "영화 추천받기").await.unwrap();
    h.runner.run_turn("s", "완료").await.unwrap();

    let reply = h
        .runner
        .run_turn("s", "상관없음")
        .await
        .unwrap()
        .reply
        .unwrap();
    assert!(reply.text.contains("조건에 맞는 영화를 찾지 못했어요"));
    assert!(reply.text.contains("인기 영화가 없습니다."));
}

//! Plain-text rendering of recommendation results and filter summaries for
//! the chat transcript.

use crate::catalog::Movie;
use crate::filter::Filter;
use crate::recommend::RecommendationResult;

fn movie_line(index: usize, movie: &Movie) -> String {
    match movie.rating {
        Some(rating) => format!("{}. {} ⭐ {:.1}", index + 1, movie.title, rating),
        None => format!("{}. {}", index + 1, movie.title),
    }
}

fn list_block(movies: &[Movie], empty_text: &str) -> String {
    if movies.is_empty() {
        return empty_text.to_string();
    }
    movies
        .iter()
        .enumerate()
        .map(|(i, m)| movie_line(i, m))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn result_blocks(result: &RecommendationResult) -> String {
    format!(
        "🎯 맞춤 추천\n{}\n\n🔥 인기 영화\n{}",
        list_block(&result.algorithmic, "조건에 맞는 영화를 찾지 못했어요 😢"),
        list_block(&result.popular, "인기 영화가 없습니다."),
    )
}

pub fn popular_block(movies: &[Movie]) -> String {
    format!(
        "🔥 인기 영화\n{}",
        list_block(movies, "인기 영화가 없습니다.")
    )
}

pub fn advanced_filter_prompt(filter: &Filter) -> String {
    let genres = if filter.genres().is_empty() {
        "없음".to_string()
    } else {
        filter.genres().join(", ")
    };
    let adult = if filter.exclude_adult {
        "켜짐"
    } else {
        "꺼짐"
    };
    format!(
        "고급 필터를 설정해주세요 🔧\n현재 장르: {genres}\n성인 콘텐츠 제외: {adult}\n장르를 눌러 바꾸고 \"적용\"을 눌러주세요!"
    )
}

//! The recommendation filter: a pure, total function over an already-fetched
//! catalog. No I/O, no randomness; ranking is deterministic with catalog
//! order as the tie-break so results are reproducible and testable.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::Movie;
use crate::filter::Filter;

/// How many movies each result list holds at most.
pub const LIST_SIZE: usize = 3;

/// The two disjoint result lists rendered in the chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Preference-matched picks, best match first.
    pub algorithmic: Vec<Movie>,
    /// Popularity-ranked fallback, disjoint from `algorithmic`.
    pub popular: Vec<Movie>,
}

fn rating(movie: &Movie) -> f64 {
    movie.rating.unwrap_or(0.0)
}

fn popularity(movie: &Movie) -> f64 {
    movie.popularity.unwrap_or(0.0)
}

/// Compute both result lists for one filter application.
///
/// Watched movies never appear in either list. An empty genre set means no
/// genre constraint. When fewer than [`LIST_SIZE`] movies match the genres,
/// `algorithmic` is backfilled with the best-rated non-matching candidates.
pub fn recommend(
    filter: &Filter,
    catalog: &[Movie],
    watched: &HashSet<i64>,
) -> RecommendationResult {
    let candidates: Vec<&Movie> = catalog
        .iter()
        .filter(|m| !watched.contains(&m.id))
        .filter(|m| !(filter.exclude_adult && m.adult))
        .collect();

    let mut matched: Vec<&Movie> = if filter.genres().is_empty() {
        candidates.clone()
    } else {
        candidates
            .iter()
            .copied()
            .filter(|m| m.genres.iter().any(|g| filter.genres().contains(g)))
            .collect()
    };
    // stable: equal ratings keep catalog order
    matched.sort_by(|a, b| rating(b).total_cmp(&rating(a)));

    let mut algorithmic: Vec<Movie> = matched
        .iter()
        .take(LIST_SIZE)
        .map(|m| (*m).clone())
        .collect();

    if algorithmic.len() < LIST_SIZE {
        let chosen: HashSet<i64> = algorithmic.iter().map(|m| m.id).collect();
        let mut rest: Vec<&Movie> = candidates
            .iter()
            .copied()
            .filter(|m| !chosen.contains(&m.id))
            .collect();
        rest.sort_by(|a, b| rating(b).total_cmp(&rating(a)));
        algorithmic.extend(
            rest.into_iter()
                .take(LIST_SIZE - algorithmic.len())
                .cloned(),
        );
    }

    let chosen: HashSet<i64> = algorithmic.iter().map(|m| m.id).collect();
    let mut popular_pool: Vec<&Movie> = candidates
        .iter()
        .copied()
        .filter(|m| !chosen.contains(&m.id))
        .collect();
    popular_pool.sort_by(|a, b| popularity(b).total_cmp(&popularity(a)));
    let popular: Vec<Movie> = popular_pool
        .into_iter()
        .take(LIST_SIZE)
        .cloned()
        .collect();

    RecommendationResult {
        algorithmic,
        popular,
    }
}

/// Popularity-only ranking for the "show popular only" side quest.
pub fn popular_only(catalog: &[Movie], watched: &HashSet<i64>) -> Vec<Movie> {
    let mut pool: Vec<&Movie> = catalog.iter().filter(|m| !watched.contains(&m.id)).collect();
    pool.sort_by(|a, b| popularity(b).total_cmp(&popularity(a)));
    pool.into_iter().take(LIST_SIZE).cloned().collect()
}

//! Onboarding preference collection: swipe signals folded into a fixed-length
//! preference vector plus an OTT platform selection.

use serde::{Deserialize, Serialize};

/// The fixed genre categories the preference vector encodes, one slot each.
pub const VECTOR_GENRES: [&str; 10] = [
    "Action",
    "Comedy",
    "Drama",
    "Sci-Fi",
    "Horror",
    "Romance",
    "Thriller",
    "Fantasy",
    "Animation",
    "Documentary",
];

fn genre_slot(genre: &str) -> Option<usize> {
    VECTOR_GENRES.iter().position(|g| *g == genre)
}

/// Accumulates like/dislike swipes during onboarding.
///
/// Dislikes are discarded rather than encoded: a `liked=false` swipe never
/// removes a previously liked genre and never writes a slot back to 0.
///
/// A liked genre outside [`VECTOR_GENRES`] still enters `liked_genres` (it is
/// shown in summaries) but has no vector slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceBuilder {
    liked_genres: Vec<String>,
    preference_vector: Vec<u8>,
    ott: Vec<String>,
    skipped: bool,
}

impl Default for PreferenceBuilder {
    fn default() -> Self {
        Self {
            liked_genres: Vec::new(),
            preference_vector: vec![0; VECTOR_GENRES.len()],
            ott: Vec::new(),
            skipped: false,
        }
    }
}

impl PreferenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one swipe. Idempotent for likes; a no-op for dislikes.
    pub fn record_swipe(&mut self, genre: &str, liked: bool) {
        if !liked {
            return;
        }
        if !self.liked_genres.iter().any(|g| g == genre) {
            self.liked_genres.push(genre.to_string());
        }
        if let Some(slot) = genre_slot(genre) {
            self.preference_vector[slot] = 1;
        }
    }

    pub fn toggle_ott(&mut self, platform: &str) {
        if let Some(pos) = self.ott.iter().position(|p| p == platform) {
            self.ott.remove(pos);
        } else {
            self.ott.push(platform.to_string());
        }
    }

    pub fn set_skipped(&mut self, skipped: bool) {
        self.skipped = skipped;
    }

    /// Always exactly [`VECTOR_GENRES`]`.len()` slots, 1 for liked genres.
    pub fn vector(&self) -> &[u8] {
        &self.preference_vector
    }

    pub fn liked_genres(&self) -> &[String] {
        &self.liked_genres
    }

    pub fn ott(&self) -> &[String] {
        &self.ott
    }

    pub fn skipped(&self) -> bool {
        self.skipped
    }

    /// Back to a blank slate; used when the user restarts onboarding.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

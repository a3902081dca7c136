//! Genre vocabulary shared by the chatbot and the recommendation filter.
//!
//! The chat UI speaks Korean display labels; the catalog and the filter use
//! canonical English labels. The mapping is fixed and intentionally small.

/// Genre quick replies offered during the conversation, in display order.
pub const GENRES: [&str; 11] = [
    "액션",
    "SF",
    "드라마",
    "로맨스",
    "애니메이션",
    "공포",
    "스릴러",
    "모험",
    "범죄",
    "판타지",
    "가족",
];

/// Korean display label -> canonical catalog label.
pub fn canonical(korean: &str) -> Option<&'static str> {
    match korean {
        "액션" => Some("Action"),
        "SF" => Some("Sci-Fi"),
        "드라마" => Some("Drama"),
        "로맨스" => Some("Romance"),
        "애니메이션" => Some("Animation"),
        "공포" => Some("Horror"),
        "스릴러" => Some("Thriller"),
        "모험" => Some("Adventure"),
        "범죄" => Some("Crime"),
        "판타지" => Some("Fantasy"),
        "가족" => Some("Family"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_display_genre_has_a_canonical_label() {
        for genre in GENRES {
            assert!(canonical(genre).is_some(), "missing mapping for {genre}");
        }
    }

    #[test]
    fn unknown_label_maps_to_none() {
        assert_eq!(canonical("서부"), None);
    }
}

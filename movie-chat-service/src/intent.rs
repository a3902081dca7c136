//! Free-text intent parsing.
//!
//! Deliberately not NLP: an ordered list of keyword rules scanned top to
//! bottom, first match wins. The vocabulary and the rule order are part of the
//! observable behavior (e.g. the broad "다" rule fires before any genre rule),
//! so changes here change what the bot understands.

use crate::filter::TimeChoice;
use crate::genres::GENRES;

/// What the user meant, as far as keyword matching can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Time(TimeChoice),
    /// Korean display label of the matched genre.
    Genre(&'static str),
    Start,
    Confirm,
    Unknown,
}

const TIME_RULES: [(&[&str], TimeChoice); 4] = [
    (&["1시간", "짧은", "60분"], TimeChoice::OneHour),
    (&["2시간", "120분"], TimeChoice::TwoHours),
    (&["3시간", "긴", "180분"], TimeChoice::ThreeHours),
    (&["상관없", "아무", "다"], TimeChoice::Any),
];

/// English genre keyword -> Korean display label.
const ENGLISH_GENRE_RULES: [(&[&str], &str); 7] = [
    (&["action"], "액션"),
    (&["sci-fi", "sf"], "SF"),
    (&["drama"], "드라마"),
    (&["romance"], "로맨스"),
    (&["animation"], "애니메이션"),
    (&["horror"], "공포"),
    (&["thriller"], "스릴러"),
];

const START_KEYWORDS: [&str; 3] = ["추천", "찾", "보고싶"];
const CONFIRM_KEYWORDS: [&str; 4] = ["네", "예", "좋", "응"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

pub fn parse_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();

    for (keywords, choice) in TIME_RULES {
        if contains_any(&lower, keywords) {
            return Intent::Time(choice);
        }
    }

    for genre in GENRES {
        if lower.contains(&genre.to_lowercase()) {
            return Intent::Genre(genre);
        }
    }
    for (keywords, genre) in ENGLISH_GENRE_RULES {
        if contains_any(&lower, keywords) {
            return Intent::Genre(genre);
        }
    }

    if contains_any(&lower, &START_KEYWORDS) {
        return Intent::Start;
    }
    if contains_any(&lower, &CONFIRM_KEYWORDS) {
        return Intent::Confirm;
    }

    Intent::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommendation_request_parses_as_start() {
        assert_eq!(parse_intent("영화 추천"), Intent::Start);
        assert_eq!(parse_intent("재밌는 거 찾는 중"), Intent::Start);
    }

    #[test]
    fn time_keywords_win_over_everything() {
        assert_eq!(parse_intent("1시간짜리"), Intent::Time(TimeChoice::OneHour));
        assert_eq!(parse_intent("짧은 영화"), Intent::Time(TimeChoice::OneHour));
        assert_eq!(parse_intent("120분 정도"), Intent::Time(TimeChoice::TwoHours));
        assert_eq!(parse_intent("긴 영화"), Intent::Time(TimeChoice::ThreeHours));
        assert_eq!(parse_intent("상관없어요"), Intent::Time(TimeChoice::Any));
        // the broad "다" rule fires before the genre rules
        assert_eq!(parse_intent("드라마 보고싶다"), Intent::Time(TimeChoice::Any));
    }

    #[test]
    fn genre_keywords_in_both_languages() {
        assert_eq!(parse_intent("스릴러 어때"), Intent::Genre("스릴러"));
        assert_eq!(parse_intent("horror movie"), Intent::Genre("공포"));
        assert_eq!(parse_intent("sci-fi"), Intent::Genre("SF"));
        // lowercase "sf" also matches the Korean label scan
        assert_eq!(parse_intent("sf물"), Intent::Genre("SF"));
    }

    #[test]
    fn confirm_and_unknown() {
        assert_eq!(parse_intent("네"), Intent::Confirm);
        assert_eq!(parse_intent("!!!"), Intent::Unknown);
        assert_eq!(parse_intent(""), Intent::Unknown);
    }
}

use async_trait::async_trait;
use chat_flow::{Context, NextStep, Reply, Step, StepResult, USER_INPUT_KEY};

use crate::filter::TimeChoice;
use crate::genres::GENRES;
use crate::intent::{Intent, parse_intent};
use crate::steps::{labels, session_keys, step_ids};

const COMPLETION_KEYWORDS: [&str; 3] = ["완료", "다음", "좋아"];

/// Genre collection with toggle semantics. A completion signal advances to
/// the time step; advancing with zero genres is fine and leaves the filter
/// unconstrained.
pub struct GenreStep;

fn genre_quick_replies() -> Vec<String> {
    GENRES
        .iter()
        .map(|g| g.to_string())
        .chain(std::iter::once(labels::DONE.to_string()))
        .collect()
}

/// Exact quick-reply label, or a genre parsed out of free text.
fn genre_label(input: &str) -> Option<&'static str> {
    if let Some(label) = GENRES.iter().find(|g| **g == input) {
        return Some(label);
    }
    match parse_intent(input) {
        Intent::Genre(label) => Some(label),
        _ => None,
    }
}

#[async_trait]
impl Step for GenreStep {
    fn id(&self) -> &str {
        step_ids::GENRE
    }

    async fn run(&self, context: Context) -> chat_flow::Result<StepResult> {
        let input: String = context.get(USER_INPUT_KEY).unwrap_or_default();
        let mut selected: Vec<String> = context
            .get(session_keys::SELECTED_GENRES)
            .unwrap_or_default();

        if input == labels::DONE {
            return Ok(advance_to_time(&selected));
        }

        if let Some(label) = genre_label(&input) {
            // toggle: re-selecting removes
            if let Some(pos) = selected.iter().position(|g| g == label) {
                selected.remove(pos);
            } else {
                selected.push(label.to_string());
            }
            context.set(session_keys::SELECTED_GENRES, &selected);

            let text = if selected.is_empty() {
                "선택된 장르가 없어요.\n장르를 선택하시거나 \"완료\"를 눌러주세요!".to_string()
            } else {
                format!(
                    "현재 선택: {}\n더 선택하시거나 \"완료\"를 눌러주세요!",
                    selected.join(", ")
                )
            };
            return Ok(StepResult::reply(
                Reply::with_quick_replies(text, genre_quick_replies()),
                NextStep::AwaitInput,
            ));
        }

        if COMPLETION_KEYWORDS.iter().any(|kw| input.contains(kw)) {
            return Ok(advance_to_time(&selected));
        }

        Ok(StepResult::ignore())
    }
}

fn advance_to_time(selected: &[String]) -> StepResult {
    let text = if selected.is_empty() {
        "알겠어요! 얼마나 시간이 있으세요?".to_string()
    } else {
        format!("{} 장르 좋네요! 👍\n얼마나 시간이 있으세요?", selected.join(", "))
    };
    StepResult::reply(
        Reply::with_quick_replies(text, TimeChoice::labels()),
        NextStep::Advance,
    )
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeParseError {
    #[error("invalid duration: {0} (expected HH:MM)")]
    Invalid(String),
}

/// A time budget entered as `"HH:MM"`, kept as minutes.
///
/// Malformed input is rejected here, before it ever reaches the
/// recommendation filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBudget {
    minutes: u32,
}

impl TimeBudget {
    pub fn from_minutes(minutes: u32) -> Self {
        Self { minutes }
    }

    pub fn parse(raw: &str) -> Result<Self, TimeParseError> {
        let invalid = || TimeParseError::Invalid(raw.to_string());
        let (hours, minutes) = raw.split_once(':').ok_or_else(invalid)?;
        let hours: u32 = hours.trim().parse().map_err(|_| invalid())?;
        let minutes: u32 = minutes.trim().parse().map_err(|_| invalid())?;
        if minutes >= 60 {
            return Err(invalid());
        }
        Ok(Self {
            minutes: hours * 60 + minutes,
        })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }
}

/// The four canonical time answers the chatbot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeChoice {
    OneHour,
    TwoHours,
    ThreeHours,
    /// "상관없음" – no real constraint; encoded as a generous 12 hours.
    Any,
}

impl TimeChoice {
    pub const ALL: [TimeChoice; 4] = [
        TimeChoice::OneHour,
        TimeChoice::TwoHours,
        TimeChoice::ThreeHours,
        TimeChoice::Any,
    ];

    /// Quick-reply label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            TimeChoice::OneHour => "1시간",
            TimeChoice::TwoHours => "2시간",
            TimeChoice::ThreeHours => "3시간",
            TimeChoice::Any => "상관없음",
        }
    }

    /// The duration token each label maps to.
    pub fn clock(&self) -> &'static str {
        match self {
            TimeChoice::OneHour => "01:00",
            TimeChoice::TwoHours => "02:00",
            TimeChoice::ThreeHours => "03:00",
            TimeChoice::Any => "12:00",
        }
    }

    pub fn budget(&self) -> TimeBudget {
        let minutes = match self {
            TimeChoice::OneHour => 60,
            TimeChoice::TwoHours => 120,
            TimeChoice::ThreeHours => 180,
            TimeChoice::Any => 720,
        };
        TimeBudget::from_minutes(minutes)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    pub fn labels() -> Vec<String> {
        Self::ALL.iter().map(|c| c.label().to_string()).collect()
    }
}

/// Filter accumulated over one conversation session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    pub time: Option<TimeBudget>,
    /// Canonical genre labels, deduplicated, toggle semantics.
    genres: Vec<String>,
    pub exclude_adult: bool,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&mut self, time: TimeBudget) {
        self.time = Some(time);
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    /// Selecting an already-selected genre removes it.
    pub fn toggle_genre(&mut self, genre: impl Into<String>) {
        let genre = genre.into();
        if let Some(pos) = self.genres.iter().position(|g| *g == genre) {
            self.genres.remove(pos);
        } else {
            self.genres.push(genre);
        }
    }

    /// Replace the genre set, deduplicating while keeping first-seen order.
    pub fn set_genres<I, S>(&mut self, genres: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres.clear();
        for genre in genres {
            let genre = genre.into();
            if !self.genres.contains(&genre) {
                self.genres.push(genre);
            }
        }
    }
}

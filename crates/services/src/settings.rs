use std::env;

pub const DEFAULT_TIMER_SECS: u32 = 30;
pub const DEFAULT_QUESTION_COUNT: u32 = 5;
pub const DEFAULT_LANGUAGE: &str = "en";

/// Tunables for a quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    timer_secs: u32,
    question_count: u32,
    language: String,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            timer_secs: DEFAULT_TIMER_SECS,
            question_count: DEFAULT_QUESTION_COUNT,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl QuizSettings {
    /// Reads `STUDYMATE_TIMER_SECS`, `STUDYMATE_QUESTION_COUNT` and
    /// `STUDYMATE_LANGUAGE`, keeping defaults for anything missing or invalid.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str| lookup(key).and_then(|raw| raw.trim().parse::<u32>().ok());
        let mut settings = Self::default();
        if let Some(secs) = parse("STUDYMATE_TIMER_SECS") {
            settings = settings.with_timer_secs(secs);
        }
        if let Some(count) = parse("STUDYMATE_QUESTION_COUNT") {
            settings = settings.with_question_count(count);
        }
        if let Some(language) = lookup("STUDYMATE_LANGUAGE") {
            settings = settings.with_language(language);
        }
        settings
    }

    /// Countdown length per timed question; clamped to at least one second.
    #[must_use]
    pub fn with_timer_secs(mut self, secs: u32) -> Self {
        self.timer_secs = secs.max(1);
        self
    }

    /// Number of questions requested per set; clamped to at least one.
    #[must_use]
    pub fn with_question_count(mut self, count: u32) -> Self {
        self.question_count = count.max(1);
        self
    }

    /// Blank values keep the current language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        if !language.trim().is_empty() {
            self.language = language.trim().to_string();
        }
        self
    }

    #[must_use]
    pub fn timer_secs(&self) -> u32 {
        self.timer_secs
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }
}

//! Target date resolution.
//!
//! A run collects exactly one calendar day. Candidates are consulted in
//! this order:
//!
//! 1. the explicit override (`--date`, `FEED_DATE`, or `date:` in the config file)
//! 2. the `DATE` environment variable
//! 3. a prompt on the terminal, if one is attached
//! 4. yesterday, relative to process start, in local time
//!
//! Automated mode (`auto_yesterday`) skips steps 2 and 3. The first
//! non-empty candidate decides: if it is malformed, a warning is logged and
//! the run falls back to yesterday rather than trying the next step.

use crate::models::TargetDate;
use chrono::NaiveDate;
use std::io::{self, BufRead, IsTerminal, Write};
use tracing::{debug, info, warn};

/// Environment variable consulted in step 2.
pub const DATE_ENV: &str = "DATE";

/// Source of an interactively typed date.
pub trait DatePrompt {
    /// Ask for a date. `None` means nobody is there to answer.
    fn ask(&mut self) -> Option<String>;
}

/// Prompts on stderr and reads one line from stdin, but only when stdin is
/// a terminal.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl DatePrompt for StdinPrompt {
    fn ask(&mut self) -> Option<String> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            debug!("stdin is not a terminal; skipping date prompt");
            return None;
        }

        let mut stderr = io::stderr();
        let _ = write!(stderr, "Enter date YYYY-MM-DD (empty = yesterday): ");
        let _ = stderr.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

/// A prompt that never answers.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct NoPrompt;

#[cfg(test)]
impl DatePrompt for NoPrompt {
    fn ask(&mut self) -> Option<String> {
        None
    }
}

/// Decides the run's [`TargetDate`].
#[derive(Debug, Clone, Default)]
pub struct DateResolver {
    /// Step 1 candidate.
    pub explicit: Option<String>,
    /// Step 2 candidate, normally the value of [`DATE_ENV`].
    pub env_value: Option<String>,
    /// Skip steps 2 and 3.
    pub auto_yesterday: bool,
    /// Allow step 3 at all.
    pub interactive: bool,
}

impl DateResolver {
    /// Resolve the target date.
    ///
    /// `today` is the local calendar date at process start. This never fails:
    /// bad input is logged and replaced by yesterday.
    pub fn resolve(&self, today: NaiveDate, prompt: &mut impl DatePrompt) -> TargetDate {
        let yesterday = TargetDate::yesterday_of(today);

        let candidate = non_empty(self.explicit.as_deref())
            .map(|d| ("override", d.to_string()))
            .or_else(|| {
                if self.auto_yesterday {
                    return None;
                }
                non_empty(self.env_value.as_deref())
                    .map(|d| ("environment", d.to_string()))
                    .or_else(|| {
                        if !self.interactive {
                            return None;
                        }
                        prompt
                            .ask()
                            .filter(|d| !d.trim().is_empty())
                            .map(|d| ("prompt", d))
                    })
            });

        let Some((origin, raw)) = candidate else {
            info!(
                date = %yesterday,
                auto_yesterday = self.auto_yesterday,
                "Using yesterday's date"
            );
            return yesterday;
        };

        match raw.parse::<TargetDate>() {
            Ok(date) => {
                info!(%date, origin, "Using requested date");
                date
            }
            Err(e) => {
                warn!(
                    input = %raw,
                    origin,
                    error = %e,
                    fallback = %yesterday,
                    "Bad date; using yesterday"
                );
                yesterday
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Answer(Option<&'static str>, usize);

    impl DatePrompt for Answer {
        fn ask(&mut self) -> Option<String> {
            self.1 += 1;
            self.0.map(str::to_string)
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()
    }

    #[test]
    fn test_empty_override_in_auto_mode_is_yesterday() {
        let resolver = DateResolver {
            explicit: Some(String::new()),
            auto_yesterday: true,
            ..Default::default()
        };
        assert_eq!(resolver.resolve(today(), &mut NoPrompt).to_string(), "2024-03-15");
    }

    #[test]
    fn test_malformed_override_falls_back_to_yesterday() {
        let resolver = DateResolver {
            explicit: Some("15-03-2024".into()),
            auto_yesterday: false,
            interactive: true,
            ..Default::default()
        };
        let mut prompt = Answer(None, 0);
        assert_eq!(resolver.resolve(today(), &mut prompt).to_string(), "2024-03-15");
        assert_eq!(prompt.1, 0, "a bad override must not fall through to the prompt");
    }

    #[test]
    fn test_explicit_override_wins_even_in_auto_mode() {
        let resolver = DateResolver {
            explicit: Some("2024-01-02".into()),
            env_value: Some("2023-12-31".into()),
            auto_yesterday: true,
            interactive: true,
        };
        assert_eq!(resolver.resolve(today(), &mut NoPrompt).to_string(), "2024-01-02");
    }

    #[test]
    fn test_environment_before_prompt() {
        let resolver = DateResolver {
            env_value: Some("2023-12-31".into()),
            interactive: true,
            ..Default::default()
        };
        let mut prompt = Answer(Some("2020-01-01"), 0);
        assert_eq!(resolver.resolve(today(), &mut prompt).to_string(), "2023-12-31");
        assert_eq!(prompt.1, 0);
    }

    #[test]
    fn test_auto_mode_ignores_environment_and_prompt() {
        let resolver = DateResolver {
            env_value: Some("2023-12-31".into()),
            auto_yesterday: true,
            interactive: true,
            ..Default::default()
        };
        let mut prompt = Answer(Some("2020-01-01"), 0);
        assert_eq!(resolver.resolve(today(), &mut prompt).to_string(), "2024-03-15");
        assert_eq!(prompt.1, 0);
    }

    #[test]
    fn test_prompt_answer_used_when_attended() {
        let resolver = DateResolver {
            interactive: true,
            ..Default::default()
        };
        let mut prompt = Answer(Some(" 2024-02-29 "), 0);
        assert_eq!(resolver.resolve(today(), &mut prompt).to_string(), "2024-02-29");
    }

    #[test]
    fn test_empty_prompt_answer_means_yesterday() {
        let resolver = DateResolver {
            interactive: true,
            ..Default::default()
        };
        let mut prompt = Answer(Some(""), 0);
        assert_eq!(resolver.resolve(today(), &mut prompt).to_string(), "2024-03-15");
        assert_eq!(prompt.1, 1);
    }

    #[test]
    fn test_non_interactive_never_prompts() {
        let resolver = DateResolver::default();
        let mut prompt = Answer(Some("2020-01-01"), 0);
        assert_eq!(resolver.resolve(today(), &mut prompt).to_string(), "2024-03-15");
        assert_eq!(prompt.1, 0);
    }
}

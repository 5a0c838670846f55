use crate::model::{AnswerState, FieldId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

impl Progress {
    /// `round(answered / total * 100)`; 0 when there is nothing to answer.
    pub fn percent(&self) -> u16 {
        if self.total == 0 {
            return 0;
        }
        (self.answered as f64 / self.total as f64 * 100.0).round() as u16
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.answered as f64 / self.total as f64).clamp(0.0, 1.0)
        }
    }

    pub fn label(&self) -> String {
        format!("{} / {}", self.answered, self.total)
    }
}

/// Derives completion from the answer state. Holds no answers of its own.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: usize,
    required_fields: Vec<FieldId>,
    last: Progress,
}

impl ProgressTracker {
    /// `required_fields` only matters for free-text sessions: the unit counts
    /// as answered once every one of them holds non-blank text.
    pub fn new(total_units: usize, required_fields: Vec<FieldId>) -> Self {
        Self {
            total: total_units,
            required_fields,
            last: Progress {
                answered: 0,
                total: total_units,
            },
        }
    }

    pub fn recompute(&mut self, answers: &AnswerState) -> Progress {
        let answered = match answers {
            AnswerState::Choice(map) => map.len(),
            AnswerState::FreeText(_) => {
                let complete = !self.required_fields.is_empty()
                    && self
                        .required_fields
                        .iter()
                        .all(|f| answers.text(f).is_some_and(|t| !t.trim().is_empty()));
                usize::from(complete)
            }
        };
        self.last = Progress {
            answered: answered.min(self.total),
            total: self.total,
        };
        self.last
    }

    pub fn current(&self) -> Progress {
        self.last
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_half_up() {
        let p = Progress {
            answered: 1,
            total: 8,
        };
        assert_eq!(p.percent(), 13);
        assert_eq!(Progress::default().percent(), 0);
    }

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t "), 0);
        assert_eq!(word_count("  one two\nthree  "), 3);
    }

    #[test]
    fn recompute_is_idempotent() {
        use crate::model::{OptionId, QuestionId};

        let mut answers = AnswerState::empty(crate::model::SessionKind::Choice);
        answers.select(QuestionId(1), OptionId(2));
        answers.select(QuestionId(5), OptionId(1));
        let mut tracker = ProgressTracker::new(30, Vec::new());
        let first = tracker.recompute(&answers);
        assert_eq!(tracker.recompute(&answers), first);
        assert_eq!(first.label(), "2 / 30");
    }
}

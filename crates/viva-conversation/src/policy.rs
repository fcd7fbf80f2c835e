//! Follow-up decision policy.

use viva_protocols::question::{Question, QuestionCategory};

/// Decides whether an answer warrants the question's single follow-up.
///
/// The flow consults the policy but owns the at-most-once bookkeeping;
/// swapping in a stronger classifier does not touch the state machine.
pub trait FollowUpPolicy: Send + Sync {
    /// Whether the answer needs a follow-up.
    fn needs_follow_up(&self, question: &Question, answer: &str) -> bool;

    /// The follow-up utterance for a question.
    fn follow_up_prompt(&self, question: &Question) -> String {
        format!(
            "Thanks - could you expand on that a little? I'd like to hear more \
             detail on \"{}\".",
            question.prompt
        )
    }
}

/// Default heuristic: the answer is too short for the question's
/// category, or touches none of the question's evaluation criteria.
#[derive(Debug, Clone)]
pub struct AnswerHeuristicPolicy {
    /// Minimum word counts per category.
    pub behavioral_min_words: usize,
    pub technical_min_words: usize,
    pub situational_min_words: usize,
    pub background_min_words: usize,
}

impl Default for AnswerHeuristicPolicy {
    fn default() -> Self {
        Self {
            behavioral_min_words: 40,
            technical_min_words: 30,
            situational_min_words: 35,
            background_min_words: 15,
        }
    }
}

impl AnswerHeuristicPolicy {
    fn min_words(&self, category: QuestionCategory) -> usize {
        match category {
            QuestionCategory::Behavioral => self.behavioral_min_words,
            QuestionCategory::Technical => self.technical_min_words,
            QuestionCategory::Situational => self.situational_min_words,
            QuestionCategory::Background => self.background_min_words,
        }
    }
}

impl FollowUpPolicy for AnswerHeuristicPolicy {
    fn needs_follow_up(&self, question: &Question, answer: &str) -> bool {
        let words = answer.split_whitespace().count();
        if words < self.min_words(question.category) {
            return true;
        }

        if question.evaluation_criteria.is_empty() {
            return false;
        }

        // At least one criterion keyword should surface in the answer
        let lower = answer.to_lowercase();
        !question.evaluation_criteria.iter().any(|criterion| {
            criterion
                .split_whitespace()
                .next()
                .map(|keyword| lower.contains(&keyword.to_lowercase()))
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viva_protocols::question::Difficulty;

    fn question(category: QuestionCategory, criteria: Vec<&str>) -> Question {
        Question::new(0, category, Difficulty::Medium, "Tell me about a project")
            .with_criteria(criteria.into_iter().map(String::from).collect())
    }

    fn long_answer(words: usize) -> String {
        vec!["detail"; words].join(" ")
    }

    #[test]
    fn test_short_answer_needs_follow_up() {
        let policy = AnswerHeuristicPolicy::default();
        let q = question(QuestionCategory::Behavioral, vec![]);
        assert!(policy.needs_follow_up(&q, "It went fine."));
    }

    #[test]
    fn test_long_answer_without_criteria_passes() {
        let policy = AnswerHeuristicPolicy::default();
        let q = question(QuestionCategory::Behavioral, vec![]);
        assert!(!policy.needs_follow_up(&q, &long_answer(50)));
    }

    #[test]
    fn test_missing_criteria_elements_needs_follow_up() {
        let policy = AnswerHeuristicPolicy::default();
        let q = question(QuestionCategory::Technical, vec!["latency budget", "caching"]);

        // Long but off-topic
        assert!(policy.needs_follow_up(&q, &long_answer(40)));

        // Mentions one criterion keyword
        let answer = format!("{} we kept latency low by batching", long_answer(30));
        assert!(!policy.needs_follow_up(&q, &answer));
    }

    #[test]
    fn test_category_thresholds_differ() {
        let policy = AnswerHeuristicPolicy::default();
        let background = question(QuestionCategory::Background, vec![]);
        let behavioral = question(QuestionCategory::Behavioral, vec![]);
        let answer = long_answer(20);

        assert!(!policy.needs_follow_up(&background, &answer));
        assert!(policy.needs_follow_up(&behavioral, &answer));
    }
}

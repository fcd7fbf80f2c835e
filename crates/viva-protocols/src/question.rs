//! Scripted interview questions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Question category. Drives the follow-up heuristic thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Behavioral,
    Technical,
    Situational,
    Background,
}

/// Question difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One scripted question. Immutable once the script is generated;
/// read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique question ID.
    pub id: Uuid,
    /// Position within the script, starting at 0.
    pub order: u32,
    /// Category.
    pub category: QuestionCategory,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// The question as asked.
    pub prompt: String,
    /// Outline of what a strong answer covers.
    pub ideal_answer_outline: Vec<String>,
    /// Elements an answer is evaluated against.
    pub evaluation_criteria: Vec<String>,
}

impl Question {
    /// Create a question with empty outline and criteria.
    pub fn new(
        order: u32,
        category: QuestionCategory,
        difficulty: Difficulty,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order,
            category,
            difficulty,
            prompt: prompt.into(),
            ideal_answer_outline: Vec::new(),
            evaluation_criteria: Vec::new(),
        }
    }

    /// Set the evaluation criteria.
    pub fn with_criteria(mut self, criteria: Vec<String>) -> Self {
        self.evaluation_criteria = criteria;
        self
    }

    /// Set the ideal answer outline.
    pub fn with_outline(mut self, outline: Vec<String>) -> Self {
        self.ideal_answer_outline = outline;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_builder() {
        let q = Question::new(0, QuestionCategory::Technical, Difficulty::Hard, "Why Rust?")
            .with_criteria(vec!["ownership".to_string(), "borrowing".to_string()]);
        assert_eq!(q.order, 0);
        assert_eq!(q.evaluation_criteria.len(), 2);
        assert!(q.ideal_answer_outline.is_empty());
    }

    #[test]
    fn test_difficulty_order() {
        assert!(Difficulty::Hard > Difficulty::Medium);
        assert!(Difficulty::Medium > Difficulty::Easy);
    }
}

//! Questions and the per-session question bank.

use rand::seq::SliceRandom;

/// A single trivia question with its answer key.
///
/// The `correct_option` is compared by exact match against submitted answers
/// and is never included in client-facing views.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    /// Question text.
    pub text: String,
    /// Answer options, in authored order.
    pub options: Vec<String>,
    /// The correct option, exactly as it appears in `options`.
    pub correct_option: String,
}

impl Question {
    /// Convenience constructor.
    pub fn new(text: &str, options: &[&str], correct: &str) -> Self {
        Self {
            text: text.to_string(),
            options: options.iter().map(ToString::to_string).collect(),
            correct_option: correct.to_string(),
        }
    }
}

/// An ordered, fixed-length sequence of questions.
///
/// Shuffled once at session creation and immutable afterward.
#[derive(Clone, Debug)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank with a fresh shuffle of the given questions.
    pub fn shuffled(mut questions: Vec<Question>) -> Self {
        questions.shuffle(&mut rand::rng());
        Self { questions }
    }

    /// Build a bank preserving authored order. For fixed test fixtures.
    pub fn ordered(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the bank is empty.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The question at `index`, if within the bank.
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}

/// The built-in bank every new game is seeded with.
pub fn sample_questions() -> Vec<Question> {
    vec![
        Question::new(
            "Capital of France?",
            &["Paris", "London", "Berlin", "Madrid"],
            "Paris",
        ),
        Question::new(
            "Red planet?",
            &["Venus", "Mars", "Jupiter", "Saturn"],
            "Mars",
        ),
        Question::new(
            "Mona Lisa painted by?",
            &["Picasso", "Da Vinci", "Van Gogh", "Michelangelo"],
            "Da Vinci",
        ),
        Question::new(
            "Largest ocean?",
            &["Atlantic", "Indian", "Pacific", "Arctic"],
            "Pacific",
        ),
        Question::new(
            "Chemical symbol for gold?",
            &["Au", "Ag", "Gd", "Go"],
            "Au",
        ),
        Question::new(
            "Smallest prime number?",
            &["0", "1", "2", "3"],
            "2",
        ),
    ]
}

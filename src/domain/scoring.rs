//! Answer scoring logic.
//!
//! This module contains pure functions that implement the speed-based
//! scoring rules without side effects, making them easy to test.

use super::entity::Question;

/// How answers to untimed questions (time_limit <= 0) are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UntimedPolicy {
    /// Accept the answer with zero points; correctness still counts.
    #[default]
    ZeroScore,
    /// Accept the answer with zero points; correctness is not counted either.
    Unscored,
}

/// Result of scoring a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The answer is accepted and should be recorded on the player.
    Accepted { delta: u32, is_correct: bool },
    /// The answer arrived after the question deadline and must be discarded.
    Late,
}

/// Score a submitted answer against the current question.
///
/// # Arguments
///
/// * `question` - The question being answered
/// * `submitted` - The submitted answer text (compared verbatim)
/// * `elapsed_seconds` - Seconds elapsed since the question was asked
/// * `untimed_policy` - How to treat questions without a time limit
///
/// # Returns
///
/// `AnswerOutcome::Accepted` with the score delta to apply, or
/// `AnswerOutcome::Late` if the answer missed the deadline.
pub fn score_answer(
    question: &Question,
    submitted: &str,
    elapsed_seconds: f64,
    untimed_policy: UntimedPolicy,
) -> AnswerOutcome {
    let is_correct = submitted == question.correct_answer;

    // Untimed questions are checked first: they can never be late.
    if question.is_untimed() {
        return match untimed_policy {
            UntimedPolicy::ZeroScore => AnswerOutcome::Accepted {
                delta: 0,
                is_correct,
            },
            UntimedPolicy::Unscored => AnswerOutcome::Accepted {
                delta: 0,
                is_correct: false,
            },
        };
    }

    if elapsed_seconds > question.time_limit as f64 {
        return AnswerOutcome::Late;
    }

    if !is_correct {
        return AnswerOutcome::Accepted {
            delta: 0,
            is_correct: false,
        };
    }

    AnswerOutcome::Accepted {
        delta: speed_bonus(question.time_limit, elapsed_seconds),
        is_correct: true,
    }
}

/// Compute the speed bonus for a correct answer.
///
/// The time limit is divided into four equal buckets; faster answers earn
/// more points (base 10 plus a speed bonus of up to 50):
///
/// | elapsed               | points |
/// |-----------------------|--------|
/// | [0, limit/4)          | 60     |
/// | [limit/4, limit/2)    | 35     |
/// | [limit/2, 3*limit/4)  | 20     |
/// | [3*limit/4, limit]    | 10     |
///
/// The caller guarantees `0 <= elapsed_seconds <= time_limit`.
pub fn speed_bonus(time_limit: i64, elapsed_seconds: f64) -> u32 {
    let part = time_limit as f64 / 4.0;
    if elapsed_seconds < part {
        60
    } else if elapsed_seconds < 2.0 * part {
        35
    } else if elapsed_seconds < 3.0 * part {
        20
    } else {
        10
    }
}

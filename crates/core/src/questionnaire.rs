//! Pre-visit screening questionnaire.
//!
//! Answers are collected one question at a time and can be changed freely until submission.
//! A submitted [`QuestionnaireRecord`] refers to the bill it was filled in for by bill number;
//! the bill itself is never modified.

use crate::billing::{Bill, BillNumber};
use crate::{BookingError, BookingResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub id: u8,
    pub text: &'static str,
}

/// The screening questions, in the order they are asked.
pub const QUESTIONS: [Question; 6] = [
    Question {
        id: 1,
        text: "Are you in a fasting state for this test?",
    },
    Question {
        id: 2,
        text: "When did you have your last meal?",
    },
    Question {
        id: 3,
        text: "Do you have diabetes or any other major medical conditions?",
    },
    Question {
        id: 4,
        text: "Are you taking any blood-thinning medications (e.g. Warfarin, Aspirin)?",
    },
    Question {
        id: 5,
        text: "Do you have any other allergies to drugs or materials (e.g., latex, iodine)?",
    },
    Question {
        id: 6,
        text: "Have you had a mastectomy or are you experiencing lymphedema (swelling) in either arm?",
    },
];

/// Looks up a question by id.
pub fn question(id: u8) -> BookingResult<&'static Question> {
    QUESTIONS
        .iter()
        .find(|q| q.id == id)
        .ok_or(BookingError::UnknownQuestion(id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Yes => "yes",
            Answer::No => "no",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Answer {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Ok(Answer::Yes),
            "no" | "n" => Ok(Answer::No),
            _ => Err(BookingError::InvalidAnswer(s.to_string())),
        }
    }
}

/// Answers keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<u8, Answer>", try_from = "BTreeMap<u8, Answer>")]
pub struct QuestionnaireAnswers {
    answers: BTreeMap<u8, Answer>,
}

impl QuestionnaireAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records or replaces the answer to one question.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::UnknownQuestion` if `id` is not one of [`QUESTIONS`].
    pub fn answer(&mut self, id: u8, answer: Answer) -> BookingResult<()> {
        question(id)?;
        self.answers.insert(id, answer);
        Ok(())
    }

    pub fn get(&self, id: u8) -> Option<Answer> {
        self.answers.get(&id).copied()
    }

    /// Ids of questions without an answer, in question order.
    pub fn unanswered(&self) -> Vec<u8> {
        QUESTIONS
            .iter()
            .map(|q| q.id)
            .filter(|id| !self.answers.contains_key(id))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.unanswered().is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, Answer)> + '_ {
        self.answers.iter().map(|(id, answer)| (*id, *answer))
    }
}

impl From<QuestionnaireAnswers> for BTreeMap<u8, Answer> {
    fn from(answers: QuestionnaireAnswers) -> Self {
        answers.answers
    }
}

impl TryFrom<BTreeMap<u8, Answer>> for QuestionnaireAnswers {
    type Error = BookingError;

    fn try_from(map: BTreeMap<u8, Answer>) -> Result<Self, Self::Error> {
        let mut answers = Self::new();
        for (id, answer) in map {
            answers.answer(id, answer)?;
        }
        Ok(answers)
    }
}

/// Submitted answers linked to the bill they were given for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireRecord {
    pub bill_number: BillNumber,
    pub answers: QuestionnaireAnswers,
    pub submitted_at: DateTime<Utc>,
}

impl QuestionnaireRecord {
    /// # Errors
    ///
    /// Returns `BookingError::IncompleteQuestionnaire` unless every question is answered.
    pub fn submit(
        bill: &Bill,
        answers: QuestionnaireAnswers,
        submitted_at: DateTime<Utc>,
    ) -> BookingResult<Self> {
        let unanswered = answers.unanswered();
        if !unanswered.is_empty() {
            return Err(BookingError::IncompleteQuestionnaire { unanswered });
        }
        Ok(Self {
            bill_number: bill.bill_number().clone(),
            answers,
            submitted_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{now, sample_bill};

    fn all_answered(answer: Answer) -> QuestionnaireAnswers {
        let mut answers = QuestionnaireAnswers::new();
        for q in QUESTIONS {
            answers.answer(q.id, answer).expect("known question");
        }
        answers
    }

    #[test]
    fn six_questions_numbered_in_order() {
        let ids: Vec<u8> = QUESTIONS.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn answers_can_be_changed() {
        let mut answers = QuestionnaireAnswers::new();
        answers.answer(3, Answer::Yes).expect("known question");
        answers.answer(3, Answer::No).expect("known question");
        assert_eq!(answers.get(3), Some(Answer::No));
    }

    #[test]
    fn unknown_question_is_rejected() {
        let mut answers = QuestionnaireAnswers::new();
        let err = answers.answer(7, Answer::Yes).expect_err("no question 7");
        assert!(matches!(err, BookingError::UnknownQuestion(7)));
    }

    #[test]
    fn unanswered_lists_missing_ids() {
        let mut answers = QuestionnaireAnswers::new();
        answers.answer(2, Answer::Yes).expect("known question");
        answers.answer(5, Answer::No).expect("known question");
        assert_eq!(answers.unanswered(), vec![1, 3, 4, 6]);
        assert!(!answers.is_complete());
    }

    #[test]
    fn answer_parses_yes_and_no() {
        assert_eq!("yes".parse::<Answer>().expect("yes"), Answer::Yes);
        assert_eq!(" N ".parse::<Answer>().expect("no"), Answer::No);
        assert!(matches!(
            "maybe".parse::<Answer>(),
            Err(BookingError::InvalidAnswer(_))
        ));
    }

    #[test]
    fn submit_requires_every_answer() {
        let bill = sample_bill(&[1]);
        let mut answers = all_answered(Answer::No);
        answers.answers.remove(&6);

        let err = QuestionnaireRecord::submit(&bill, answers, now()).expect_err("incomplete");
        assert!(matches!(
            err,
            BookingError::IncompleteQuestionnaire { unanswered } if unanswered == vec![6]
        ));
    }

    #[test]
    fn submitted_record_links_bill_number() {
        let bill = sample_bill(&[1]);
        let record = QuestionnaireRecord::submit(&bill, all_answered(Answer::Yes), now())
            .expect("complete");
        assert_eq!(&record.bill_number, bill.bill_number());
    }

    #[test]
    fn record_round_trips_through_json() {
        let bill = sample_bill(&[4]);
        let record = QuestionnaireRecord::submit(&bill, all_answered(Answer::No), now())
            .expect("complete");
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["answers"]["1"], "no");

        let back: QuestionnaireRecord = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, record);
    }

    #[test]
    fn deserialize_rejects_unknown_question_ids() {
        let err = serde_json::from_str::<QuestionnaireAnswers>(r#"{"9":"yes"}"#)
            .expect_err("unknown id");
        assert!(err.to_string().contains("unknown question id: 9"));
    }
}

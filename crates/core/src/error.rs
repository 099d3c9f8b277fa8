use crate::constants::EMPTY_SELECTION_MESSAGE;
use crate::routes::Route;
use chrono::NaiveDate;

/// A single failed form field, reported back to the person filling the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{}", EMPTY_SELECTION_MESSAGE)]
    EmptySelection,
    #[error("no tests have been selected for this booking")]
    NoSelection,
    #[error("no bill has been generated in this session")]
    NoBill,
    #[error("unknown test id: {0}")]
    UnknownTest(u32),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("please correct the form: {}", join_field_errors(.0))]
    InvalidForm(Vec<FieldError>),
    #[error("appointment date {date} is before today ({today})")]
    AppointmentInPast { date: NaiveDate, today: NaiveDate },
    #[error("unknown appointment time: {0}")]
    UnknownTimeSlot(String),
    #[error("unknown question id: {0}")]
    UnknownQuestion(u8),
    #[error("invalid answer '{0}' (expected yes or no)")]
    InvalidAnswer(String),
    #[error("questionnaire is incomplete, unanswered questions: {unanswered:?}")]
    IncompleteQuestionnaire { unanswered: Vec<u8> },
    #[error("online login is not available yet; please contact support")]
    LoginUnavailable,

    #[error("failed to create session store directory: {0}")]
    StoreDirCreation(std::io::Error),
    #[error("failed to read session entry: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write session entry: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to remove session entry: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to serialize session entry '{key}': {source}")]
    Serialization {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to deserialize session entry '{key}' at {path}: {source}")]
    Deserialization {
        key: &'static str,
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BookingError {
    /// Where the caller should navigate when this error is a missing-precondition failure.
    ///
    /// Precondition failures are never shown to the user; they send them back upstream.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            BookingError::NoSelection => Some(Route::NewPatient),
            BookingError::NoBill => Some(Route::Landing),
            _ => None,
        }
    }
}

pub type BookingResult<T> = std::result::Result<T, BookingError>;

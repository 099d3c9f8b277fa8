//! # Blood Test Core
//!
//! Core booking logic for the blood test center.
//!
//! This crate contains the whole booking workflow and nothing about how it is presented:
//! - The test catalog and the patient's selection
//! - Patient details and appointment slots, validated from raw form input
//! - Bill synthesis (totals, bill number) and the QR verification payload
//! - The pre-visit questionnaire
//! - The session store that hands state from one step to the next
//! - A type-state [`Booking`] that only allows the operations valid in the current step
//!
//! **No UI concerns**: terminal prompts and argument parsing belong in the `bloodtest-cli`
//! crate and the `bloodtest-run` binary.

pub mod appointment;
pub mod billing;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod landing;
pub mod patient;
pub mod questionnaire;
pub mod render;
pub mod routes;
pub mod selection;
pub mod store;
pub mod verification;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use appointment::{Appointment, AppointmentForm, TimeSlot};
pub use billing::{format_money, Bill, BillNumber, Totals};
pub use catalog::{BloodTest, Catalog};
pub use config::{store_dir_from_env_value, CoreConfig};
pub use error::{BookingError, BookingResult, FieldError};
pub use landing::{route_for, ContactInfo, ExistingPatientLogin, LandingChoice, CONTACT};
pub use patient::{PatientForm, PatientInfo};
pub use questionnaire::{Answer, Question, QuestionnaireAnswers, QuestionnaireRecord, QUESTIONS};
pub use routes::Route;
pub use selection::Selection;
pub use store::{FileStore, MemoryStore, SessionStore, StoreKey};
pub use verification::VerificationPayload;
pub use workflow::{
    navigate, reset_session, BillView, Billed, Booking, Clock, ConfirmationForm, Confirming,
    Questioned, Screen, Selecting, Submitted,
};

pub use bloodtest_types::{EmailAddress, NonEmptyText, TextError};
pub use bloodtest_verification::{QrOptions, VerificationCode};

//! The booking workflow as an explicit state machine.
//!
//! ```text
//! Selecting --continue--> Confirming --submit--> Billed --proceed--> Questioned
//!     ^                       |
//!     +---------back----------+
//! ```
//!
//! Each state is a type-state marker on [`Booking`], so an operation that only makes sense
//! in one step (submitting the confirmation form, printing the bill) cannot be called from
//! another. Steps hand state forward through the [`SessionStore`]; a step entered without its
//! upstream state fails its guard with [`BookingError::NoSelection`] or
//! [`BookingError::NoBill`], and [`navigate`] turns that failure into a redirect.

use crate::appointment::AppointmentForm;
use crate::billing::{Bill, Totals};
use crate::catalog::Catalog;
use crate::config::CoreConfig;
use crate::constants::BOOKING_ACKNOWLEDGEMENT;
use crate::error::BookingResult;
use crate::patient::PatientForm;
use crate::questionnaire::{
    Answer, Question, QuestionnaireAnswers, QuestionnaireRecord, QUESTIONS,
};
use crate::render;
use crate::routes::Route;
use crate::selection::Selection;
use crate::store::{load, save, SessionStore, StoreKey};
use crate::verification::{render_verification_code, VerificationPayload};
use crate::BookingError;
use bloodtest_verification::VerificationCode;
use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

// ============================================================================
// CLOCK
// ============================================================================

/// The moment an operation happens, as both an instant and the patient's calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
}

impl Clock {
    /// Current instant, with `today` taken from the local time zone.
    pub fn system() -> Self {
        Self {
            now: Utc::now(),
            today: Local::now().date_naive(),
        }
    }

    pub fn fixed(now: DateTime<Utc>, today: NaiveDate) -> Self {
        Self { now, today }
    }
}

// ============================================================================
// TYPE-STATE MARKERS
// ============================================================================

/// Marker: choosing tests from the catalog.
#[derive(Clone, Debug)]
pub struct Selecting {
    catalog: Catalog,
    selection: Selection,
}

/// Marker: a non-empty selection exists and patient details are being collected.
#[derive(Clone, Debug)]
pub struct Confirming {
    selection: Selection,
}

/// Marker: a bill has been issued and can be viewed.
#[derive(Clone, Debug)]
pub struct Billed {
    bill: Bill,
}

/// Marker: the screening questionnaire for a billed booking is being answered.
#[derive(Clone, Debug)]
pub struct Questioned {
    bill: Bill,
    answers: QuestionnaireAnswers,
}

// ============================================================================
// BOOKING FLOW
// ============================================================================

/// One patient's path through the booking steps.
///
/// Generic parameter `S` is one of [`Selecting`], [`Confirming`], [`Billed`] or
/// [`Questioned`].
#[derive(Clone, Debug)]
pub struct Booking<S> {
    cfg: Arc<CoreConfig>,
    state: S,
}

impl<S> Booking<S> {
    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }
}

impl Booking<Selecting> {
    /// Starts a booking with nothing selected.
    pub fn new(cfg: Arc<CoreConfig>, catalog: Catalog) -> Self {
        Self {
            cfg,
            state: Selecting {
                catalog,
                selection: Selection::new(),
            },
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.state.catalog
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    /// Selects or deselects a catalog test.
    ///
    /// Returns `true` if the test is selected after the call.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::UnknownTest` if `test_id` is not in the catalog.
    pub fn toggle(&mut self, test_id: u32) -> BookingResult<bool> {
        let test = self.state.catalog.find(test_id)?;
        Ok(self.state.selection.toggle(test))
    }

    /// Sum of the selected prices.
    pub fn total_amount(&self) -> Decimal {
        self.state.selection.total_amount()
    }

    /// Persists the selection and moves to confirmation.
    ///
    /// On failure nothing is written and this step stays usable.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::EmptySelection` if no test is selected, or a store error if the
    /// selection cannot be written.
    pub fn continue_to_confirmation<St>(
        &self,
        store: &mut St,
    ) -> BookingResult<Booking<Confirming>>
    where
        St: SessionStore + ?Sized,
    {
        if self.state.selection.is_empty() {
            return Err(BookingError::EmptySelection);
        }

        save(store, StoreKey::SelectedTests, &self.state.selection)?;
        tracing::info!(
            "selection of {} test(s) saved, moving to confirmation",
            self.state.selection.len()
        );

        Ok(Booking {
            cfg: self.cfg.clone(),
            state: Confirming {
                selection: self.state.selection.clone(),
            },
        })
    }
}

/// Everything the confirmation screen collects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationForm {
    pub patient: PatientForm,
    pub appointment: AppointmentForm,
}

/// Result of a successful confirmation: the bill step plus the message shown before moving on.
#[derive(Debug)]
pub struct Submitted {
    pub flow: Booking<Billed>,
    pub acknowledgement: &'static str,
}

impl Booking<Confirming> {
    /// Enters confirmation from the persisted selection.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::NoSelection` if no selection was saved, or it is empty, and
    /// `BookingError::InvalidInput` if a saved test is not an unmodified catalog entry.
    pub fn resume<St>(cfg: Arc<CoreConfig>, store: &St) -> BookingResult<Self>
    where
        St: SessionStore + ?Sized,
    {
        let selection: Selection = load(store, StoreKey::SelectedTests)?
            .filter(|s: &Selection| !s.is_empty())
            .ok_or(BookingError::NoSelection)?;
        selection.verify_against(&Catalog::standard())?;

        Ok(Self {
            cfg,
            state: Confirming { selection },
        })
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    /// Subtotal, tax and total for the summary panel.
    pub fn totals(&self) -> Totals {
        Totals::for_selection(&self.state.selection)
    }

    /// Returns to the test selector with the current selection still ticked.
    pub fn back(&self, catalog: Catalog) -> Booking<Selecting> {
        Booking {
            cfg: self.cfg.clone(),
            state: Selecting {
                catalog,
                selection: self.state.selection.clone(),
            },
        }
    }

    /// Validates the form, issues the bill and saves it as the current bill.
    ///
    /// A previously saved bill is replaced.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::InvalidForm` listing every failing field, or a store error if the
    /// bill cannot be written.
    pub fn submit<St>(
        &self,
        form: &ConfirmationForm,
        clock: Clock,
        store: &mut St,
    ) -> BookingResult<Submitted>
    where
        St: SessionStore + ?Sized,
    {
        let patient = form.patient.validate(clock.today);
        let appointment = form.appointment.validate(clock.today);

        let (patient, appointment) = match (patient, appointment) {
            (Ok(patient), Ok(appointment)) => (patient, appointment),
            (patient, appointment) => {
                let mut errors = patient.err().unwrap_or_default();
                errors.extend(appointment.err().unwrap_or_default());
                return Err(BookingError::InvalidForm(errors));
            }
        };

        let bill = Bill::issue(&self.state.selection, patient, appointment, clock.now)?;
        save(store, StoreKey::CurrentBill, &bill)?;
        tracing::info!(
            "issued bill {} for {} test(s), total {}",
            bill.bill_number(),
            bill.selected_tests().len(),
            bill.totals().total
        );

        Ok(Submitted {
            flow: Booking {
                cfg: self.cfg.clone(),
                state: Billed { bill },
            },
            acknowledgement: BOOKING_ACKNOWLEDGEMENT,
        })
    }
}

/// What the bill screen shows.
#[derive(Debug, Clone)]
pub struct BillView {
    pub bill: Bill,
    pub payload: VerificationPayload,
    /// `None` when the QR image could not be produced.
    pub verification_code: Option<VerificationCode>,
}

impl Booking<Billed> {
    /// Enters the bill viewer from the persisted bill.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::NoBill` if no bill was saved, or `BookingError::InvalidInput` if
    /// the saved bill's figures do not add up.
    pub fn resume<St>(cfg: Arc<CoreConfig>, store: &St) -> BookingResult<Self>
    where
        St: SessionStore + ?Sized,
    {
        let bill: Bill = load(store, StoreKey::CurrentBill)?.ok_or(BookingError::NoBill)?;
        bill.validate()?;
        Ok(Self {
            cfg,
            state: Billed { bill },
        })
    }

    pub fn bill(&self) -> &Bill {
        &self.state.bill
    }

    /// Builds the bill screen, including the QR image when it can be rendered.
    pub fn view(&self) -> BillView {
        let bill = self.state.bill.clone();
        let verification_code = render_verification_code(&bill, self.cfg.qr_options());
        BillView {
            payload: VerificationPayload::from_bill(&bill),
            bill,
            verification_code,
        }
    }

    /// The printable bill document, handed to whatever prints it.
    pub fn print(&self) -> String {
        let view = self.view();
        render::bill_html(&view.bill, view.verification_code.as_ref())
    }

    /// Moves on to the pre-visit questionnaire.
    pub fn proceed(&self) -> Booking<Questioned> {
        Booking {
            cfg: self.cfg.clone(),
            state: Questioned {
                bill: self.state.bill.clone(),
                answers: QuestionnaireAnswers::new(),
            },
        }
    }
}

impl Booking<Questioned> {
    /// Enters the questionnaire for the persisted bill.
    ///
    /// Answers already submitted for the same bill are loaded so they can be reviewed and
    /// resubmitted.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::NoBill` if no bill was saved.
    pub fn resume<St>(cfg: Arc<CoreConfig>, store: &St) -> BookingResult<Self>
    where
        St: SessionStore + ?Sized,
    {
        let billed = Booking::<Billed>::resume(cfg, store)?;
        let mut flow = billed.proceed();

        let previous: Option<QuestionnaireRecord> = load(store, StoreKey::QuestionnaireAnswers)?;
        if let Some(record) = previous {
            if &record.bill_number == flow.state.bill.bill_number() {
                flow.state.answers = record.answers;
            }
        }
        Ok(flow)
    }

    pub fn questions(&self) -> &'static [Question] {
        &QUESTIONS
    }

    pub fn bill(&self) -> &Bill {
        &self.state.bill
    }

    pub fn answers(&self) -> &QuestionnaireAnswers {
        &self.state.answers
    }

    /// # Errors
    ///
    /// Returns `BookingError::UnknownQuestion` if `question_id` is not asked.
    pub fn answer(&mut self, question_id: u8, answer: Answer) -> BookingResult<()> {
        self.state.answers.answer(question_id, answer)
    }

    /// Saves the answers, linked to this booking's bill number.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::IncompleteQuestionnaire` unless every question is answered.
    pub fn submit<St>(&self, clock: Clock, store: &mut St) -> BookingResult<QuestionnaireRecord>
    where
        St: SessionStore + ?Sized,
    {
        let record =
            QuestionnaireRecord::submit(&self.state.bill, self.state.answers.clone(), clock.now)?;
        save(store, StoreKey::QuestionnaireAnswers, &record)?;
        tracing::info!("questionnaire saved for bill {}", record.bill_number);
        Ok(record)
    }
}

/// Clears every session entry, returning the workflow to its initial state.
pub fn reset_session<St>(store: &mut St) -> BookingResult<()>
where
    St: SessionStore + ?Sized,
{
    store.clear()?;
    tracing::info!("session cleared");
    Ok(())
}

// ============================================================================
// NAVIGATION
// ============================================================================

/// A step entered by route, with its guard already checked.
#[derive(Debug)]
pub enum Screen {
    Landing,
    Selecting(Booking<Selecting>),
    Confirming(Booking<Confirming>),
    Billed(Booking<Billed>),
    Questioned(Booking<Questioned>),
    ExistingPatient,
}

impl Screen {
    pub fn route(&self) -> Route {
        match self {
            Screen::Landing => Route::Landing,
            Screen::Selecting(_) => Route::NewPatient,
            Screen::Confirming(_) => Route::Confirmation,
            Screen::Billed(_) => Route::Bill,
            Screen::Questioned(_) => Route::Questions,
            Screen::ExistingPatient => Route::ExistingPatient,
        }
    }
}

/// Opens `route`, following redirects when its precondition is missing.
///
/// Missing-precondition failures are resolved here and never reach the caller; any other
/// error (an unreadable store, a damaged entry) is returned.
pub fn navigate<St>(route: Route, cfg: Arc<CoreConfig>, store: &St) -> BookingResult<Screen>
where
    St: SessionStore + ?Sized,
{
    let mut route = route;
    loop {
        let entered = match route {
            Route::Landing => Ok(Screen::Landing),
            Route::NewPatient => Ok(Screen::Selecting(Booking::new(
                cfg.clone(),
                Catalog::standard(),
            ))),
            Route::Confirmation => {
                Booking::<Confirming>::resume(cfg.clone(), store).map(Screen::Confirming)
            }
            Route::Bill => Booking::<Billed>::resume(cfg.clone(), store).map(Screen::Billed),
            Route::Questions => {
                Booking::<Questioned>::resume(cfg.clone(), store).map(Screen::Questioned)
            }
            Route::ExistingPatient => Ok(Screen::ExistingPatient),
        };

        match entered {
            Ok(screen) => return Ok(screen),
            Err(err) => match err.redirect() {
                Some(target) => {
                    tracing::info!("{} unavailable ({}), redirecting to {}", route, err, target);
                    route = target;
                }
                None => return Err(err),
            },
        }
    }
}

//! Navigable routes of the booking flow.

use std::fmt;
use std::str::FromStr;

use crate::BookingError;

/// One screen of the booking flow, addressed by its path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    NewPatient,
    Confirmation,
    Bill,
    Questions,
    ExistingPatient,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Landing,
        Route::NewPatient,
        Route::Confirmation,
        Route::Bill,
        Route::Questions,
        Route::ExistingPatient,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::NewPatient => "/new-patient",
            Route::Confirmation => "/confirmation",
            Route::Bill => "/bill",
            Route::Questions => "/questions",
            Route::ExistingPatient => "/existing-patient",
        }
    }

    /// Screen title shown when the route is entered.
    pub fn title(self) -> &'static str {
        match self {
            Route::Landing => "Welcome",
            Route::NewPatient => "New Patient Registration",
            Route::Confirmation => "Confirm Your Appointment",
            Route::Bill => "Your Bill",
            Route::Questions => "Pre-Visit Questionnaire",
            Route::ExistingPatient => "Existing Patient",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::ALL
            .into_iter()
            .find(|route| route.path() == s)
            .ok_or_else(|| BookingError::InvalidInput(format!("unknown route: '{s}'")))
    }
}

//! Bill numbers, totals and the bill record itself.
//!
//! A [`Bill`] is computed once when the confirmation form is submitted and never changes after
//! that. Its fields are private so the money invariants (tax is 8% of the subtotal rounded to
//! two places, total is subtotal plus tax) hold for every value of the type.

use crate::appointment::{Appointment, TimeSlot};
use crate::catalog::Catalog;
use crate::constants::{
    BILL_NUMBER_DIGITS, BILL_NUMBER_PREFIX, CURRENCY_SYMBOL, MONEY_SCALE, TAX_RATE_PERCENT,
};
use crate::patient::PatientInfo;
use crate::selection::Selection;
use crate::{BookingError, BookingResult};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rounds to [`MONEY_SCALE`] places and fixes the scale so amounts always print two decimals.
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Formats an amount for display, e.g. `₹70.20`.
pub fn format_money(amount: Decimal) -> String {
    format!("{CURRENCY_SYMBOL}{}", round_money(amount))
}

/// Subtotal, tax and total of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Totals {
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let subtotal = round_money(subtotal);
        let tax = round_money(subtotal * Decimal::from(TAX_RATE_PERCENT) / Decimal::ONE_HUNDRED);
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }

    pub fn for_selection(selection: &Selection) -> Self {
        Self::from_subtotal(selection.total_amount())
    }
}

/// Bill identifier: `BT` followed by the last six digits of the issue time in Unix
/// milliseconds.
///
/// Two bills issued in the same millisecond, or exactly 1000 seconds apart, get the same
/// number. Numbers are for display and lookup within one session, not keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BillNumber(String);

impl BillNumber {
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        let modulus = 10_i64.pow(BILL_NUMBER_DIGITS as u32);
        let tail = at.timestamp_millis().rem_euclid(modulus);
        Self(format!(
            "{BILL_NUMBER_PREFIX}{tail:0width$}",
            width = BILL_NUMBER_DIGITS
        ))
    }

    /// Returns true if `input` is `BT` followed by exactly six ASCII digits.
    pub fn is_well_formed(input: &str) -> bool {
        input
            .strip_prefix(BILL_NUMBER_PREFIX)
            .is_some_and(|digits| {
                digits.len() == BILL_NUMBER_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BillNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BillNumber {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_well_formed(s) {
            return Ok(Self(s.to_string()));
        }
        Err(BookingError::InvalidInput(format!(
            "bill number must be {BILL_NUMBER_PREFIX} followed by {BILL_NUMBER_DIGITS} digits, got: '{s}'"
        )))
    }
}

impl TryFrom<String> for BillNumber {
    type Error = BookingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BillNumber> for String {
    fn from(number: BillNumber) -> Self {
        number.0
    }
}

/// The immutable record of a completed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    bill_number: BillNumber,
    patient_info: PatientInfo,
    selected_tests: Selection,
    appointment_date: NaiveDate,
    appointment_time: TimeSlot,
    subtotal: Decimal,
    tax: Decimal,
    total: Decimal,
    generated_at: DateTime<Utc>,
}

impl Bill {
    /// Computes totals and stamps a new bill at `generated_at`.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::EmptySelection` if `selection` has no tests.
    pub fn issue(
        selection: &Selection,
        patient_info: PatientInfo,
        appointment: Appointment,
        generated_at: DateTime<Utc>,
    ) -> BookingResult<Self> {
        if selection.is_empty() {
            return Err(BookingError::EmptySelection);
        }

        let totals = Totals::for_selection(selection);
        Ok(Self {
            bill_number: BillNumber::from_timestamp(generated_at),
            patient_info,
            selected_tests: selection.clone(),
            appointment_date: appointment.date,
            appointment_time: appointment.time,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            generated_at,
        })
    }

    pub fn bill_number(&self) -> &BillNumber {
        &self.bill_number
    }

    pub fn patient_info(&self) -> &PatientInfo {
        &self.patient_info
    }

    pub fn selected_tests(&self) -> &Selection {
        &self.selected_tests
    }

    pub fn appointment(&self) -> Appointment {
        Appointment {
            date: self.appointment_date,
            time: self.appointment_time,
        }
    }

    pub fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            tax: self.tax,
            total: self.total,
        }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Checks the stored tests against the catalog and the stored figures against the tests.
    ///
    /// Bills read back from a session store go through this before they are shown.
    pub fn validate(&self) -> BookingResult<()> {
        if self.selected_tests.is_empty() {
            return Err(BookingError::InvalidInput("bill has no tests".into()));
        }
        self.selected_tests.verify_against(&Catalog::standard())?;
        if self.totals() != Totals::for_selection(&self.selected_tests) {
            return Err(BookingError::InvalidInput(format!(
                "bill {} totals do not match its tests",
                self.bill_number
            )));
        }
        Ok(())
    }
}

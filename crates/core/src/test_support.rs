//! Fixtures shared by unit tests across modules.

use crate::appointment::{Appointment, AppointmentForm, TimeSlot};
use crate::billing::Bill;
use crate::catalog::Catalog;
use crate::patient::PatientForm;
use crate::selection::Selection;
use crate::workflow::ConfirmationForm;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

pub(crate) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date")
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn selection(ids: &[u32]) -> Selection {
    let catalog = Catalog::standard();
    let mut selection = Selection::new();
    for id in ids {
        selection.toggle(catalog.find(*id).expect("catalog id"));
    }
    selection
}

pub(crate) fn patient_form() -> PatientForm {
    PatientForm {
        name: "Asha Rao".into(),
        email: "asha@example.com".into(),
        phone: "9876543210".into(),
        date_of_birth: "1990-04-12".into(),
        address: "12 MG Road, Kochi".into(),
    }
}

pub(crate) fn confirmation_form() -> ConfirmationForm {
    ConfirmationForm {
        patient: patient_form(),
        appointment: AppointmentForm {
            date: "2026-10-20".into(),
            time: "09:00".into(),
        },
    }
}

pub(crate) fn sample_bill(ids: &[u32]) -> Bill {
    let patient = patient_form().validate(today()).expect("valid patient");
    let appointment = Appointment::new(today(), TimeSlot::H10, today()).expect("valid slot");
    Bill::issue(&selection(ids), patient, appointment, now()).expect("valid bill")
}

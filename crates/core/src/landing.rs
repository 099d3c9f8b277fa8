//! Landing page choices and the existing-patient placeholder.

use crate::constants::{OFFICE_HOURS, SUPPORT_EMAIL, SUPPORT_PHONE};
use crate::routes::Route;
use crate::store::{SessionStore, StoreKey};
use crate::{BookingError, BookingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingChoice {
    NewPatient,
    ExistingPatient,
}

/// Where a landing choice leads.
///
/// An existing patient with a bill already in this session goes straight to it; otherwise they
/// land on the login placeholder. Only the presence of a bill is checked here; the bill viewer
/// validates it.
pub fn route_for<St>(choice: LandingChoice, store: &St) -> BookingResult<Route>
where
    St: SessionStore + ?Sized,
{
    match choice {
        LandingChoice::NewPatient => Ok(Route::NewPatient),
        LandingChoice::ExistingPatient => {
            if store.read(StoreKey::CurrentBill)?.is_some() {
                Ok(Route::Bill)
            } else {
                Ok(Route::ExistingPatient)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactInfo {
    pub phone: &'static str,
    pub email: &'static str,
    pub hours: &'static str,
}

pub const CONTACT: ContactInfo = ContactInfo {
    phone: SUPPORT_PHONE,
    email: SUPPORT_EMAIL,
    hours: OFFICE_HOURS,
};

/// Login form shown to returning patients.
///
/// There is no patient-record backend, so submitting always fails with
/// [`BookingError::LoginUnavailable`] and the caller shows [`CONTACT`] instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingPatientLogin {
    pub patient_id_or_email: String,
    pub date_of_birth: String,
}

impl ExistingPatientLogin {
    pub fn submit(&self) -> BookingResult<()> {
        tracing::debug!("existing-patient login attempted");
        Err(BookingError::LoginUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{save, MemoryStore};
    use crate::test_support::sample_bill;

    #[test]
    fn new_patient_goes_to_selector() {
        let store = MemoryStore::new();
        assert_eq!(
            route_for(LandingChoice::NewPatient, &store).expect("route"),
            Route::NewPatient
        );
    }

    #[test]
    fn existing_patient_without_bill_sees_login() {
        let store = MemoryStore::new();
        assert_eq!(
            route_for(LandingChoice::ExistingPatient, &store).expect("route"),
            Route::ExistingPatient
        );
    }

    #[test]
    fn existing_patient_with_bill_goes_to_bill() {
        let mut store = MemoryStore::new();
        save(&mut store, StoreKey::CurrentBill, &sample_bill(&[1])).expect("save");
        assert_eq!(
            route_for(LandingChoice::ExistingPatient, &store).expect("route"),
            Route::Bill
        );
    }

    #[test]
    fn login_is_never_available() {
        let login = ExistingPatientLogin {
            patient_id_or_email: "asha@example.com".into(),
            date_of_birth: "1990-04-12".into(),
        };
        let err = login.submit().expect_err("no backend");
        assert!(matches!(err, BookingError::LoginUnavailable));
        assert_eq!(CONTACT.phone, "(555) 123-4567");
    }
}

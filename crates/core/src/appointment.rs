//! Appointment date and time slot.

use crate::error::FieldError;
use crate::patient::parse_form_date;
use crate::{BookingError, BookingResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bookable hourly slots, 08:00 through 16:00.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeSlot {
    H08,
    H09,
    H10,
    H11,
    H12,
    H13,
    H14,
    H15,
    H16,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 9] = [
        TimeSlot::H08,
        TimeSlot::H09,
        TimeSlot::H10,
        TimeSlot::H11,
        TimeSlot::H12,
        TimeSlot::H13,
        TimeSlot::H14,
        TimeSlot::H15,
        TimeSlot::H16,
    ];

    pub fn hour(self) -> u32 {
        match self {
            TimeSlot::H08 => 8,
            TimeSlot::H09 => 9,
            TimeSlot::H10 => 10,
            TimeSlot::H11 => 11,
            TimeSlot::H12 => 12,
            TimeSlot::H13 => 13,
            TimeSlot::H14 => 14,
            TimeSlot::H15 => 15,
            TimeSlot::H16 => 16,
        }
    }

    /// Stored form, e.g. `08:00`.
    pub fn as_str(self) -> &'static str {
        match self {
            TimeSlot::H08 => "08:00",
            TimeSlot::H09 => "09:00",
            TimeSlot::H10 => "10:00",
            TimeSlot::H11 => "11:00",
            TimeSlot::H12 => "12:00",
            TimeSlot::H13 => "13:00",
            TimeSlot::H14 => "14:00",
            TimeSlot::H15 => "15:00",
            TimeSlot::H16 => "16:00",
        }
    }

    /// Twelve-hour label shown in the slot picker, e.g. `1:00 PM`.
    pub fn label(self) -> String {
        let hour = self.hour();
        let (display, suffix) = match hour {
            12 => (12, "PM"),
            h if h > 12 => (h - 12, "PM"),
            h => (h, "AM"),
        };
        format!("{display}:00 {suffix}")
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeSlot {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TimeSlot::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| BookingError::UnknownTimeSlot(s.to_string()))
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = BookingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.as_str().to_string()
    }
}

/// A booked visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub date: NaiveDate,
    pub time: TimeSlot,
}

impl Appointment {
    /// # Errors
    ///
    /// Returns `BookingError::AppointmentInPast` if `date` is before `today`.
    pub fn new(date: NaiveDate, time: TimeSlot, today: NaiveDate) -> BookingResult<Self> {
        if date < today {
            return Err(BookingError::AppointmentInPast { date, today });
        }
        Ok(Self { date, time })
    }
}

/// Raw appointment form input. Both fields are required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentForm {
    /// `YYYY-MM-DD`
    pub date: String,
    /// One of the [`TimeSlot`] values, e.g. `09:00`.
    pub time: String,
}

impl AppointmentForm {
    /// # Errors
    ///
    /// Returns every failing field, in form order.
    pub fn validate(&self, today: NaiveDate) -> Result<Appointment, Vec<FieldError>> {
        let mut errors = Vec::new();

        let date = parse_form_date("appointmentDate", &self.date, &mut errors).and_then(|date| {
            if date < today {
                errors.push(FieldError {
                    field: "appointmentDate",
                    message: BookingError::AppointmentInPast { date, today }.to_string(),
                });
                None
            } else {
                Some(date)
            }
        });

        let time = if self.time.trim().is_empty() {
            errors.push(FieldError {
                field: "appointmentTime",
                message: "this field is required".into(),
            });
            None
        } else {
            match self.time.parse::<TimeSlot>() {
                Ok(slot) => Some(slot),
                Err(e) => {
                    errors.push(FieldError {
                        field: "appointmentTime",
                        message: e.to_string(),
                    });
                    None
                }
            }
        };

        let (Some(date), Some(time)) = (date, time) else {
            return Err(errors);
        };

        Appointment::new(date, time, today).map_err(|e| {
            vec![FieldError {
                field: "appointmentDate",
                message: e.to_string(),
            }]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date")
    }

    #[test]
    fn slots_cover_eight_to_four() {
        assert_eq!(TimeSlot::ALL.len(), 9);
        assert_eq!(TimeSlot::ALL[0].as_str(), "08:00");
        assert_eq!(TimeSlot::ALL[8].as_str(), "16:00");
    }

    #[test]
    fn labels_use_twelve_hour_clock() {
        assert_eq!(TimeSlot::H08.label(), "8:00 AM");
        assert_eq!(TimeSlot::H12.label(), "12:00 PM");
        assert_eq!(TimeSlot::H13.label(), "1:00 PM");
        assert_eq!(TimeSlot::H16.label(), "4:00 PM");
    }

    #[test]
    fn parse_rejects_slots_outside_the_list() {
        for bad in ["07:00", "16:30", "9:00", "noon"] {
            let err = bad.parse::<TimeSlot>().expect_err("not a slot");
            assert!(matches!(err, BookingError::UnknownTimeSlot(_)), "{bad}");
        }
    }

    #[test]
    fn appointment_today_is_allowed() {
        let appointment = Appointment::new(today(), TimeSlot::H09, today()).expect("today is ok");
        assert_eq!(appointment.date, today());
    }

    #[test]
    fn appointment_in_the_past_is_rejected() {
        let yesterday = today().pred_opt().expect("valid date");
        let err = Appointment::new(yesterday, TimeSlot::H09, today()).expect_err("past");
        assert!(matches!(err, BookingError::AppointmentInPast { .. }));
    }

    #[test]
    fn form_reports_both_missing_fields() {
        let errors = AppointmentForm::default()
            .validate(today())
            .expect_err("empty form");
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["appointmentDate", "appointmentTime"]);
    }

    #[test]
    fn form_rejects_past_date() {
        let form = AppointmentForm {
            date: "2026-10-15".into(),
            time: "10:00".into(),
        };
        let errors = form.validate(today()).expect_err("past date");
        assert_eq!(errors[0].field, "appointmentDate");
        assert!(errors[0].message.contains("before today"));
    }

    #[test]
    fn form_reports_past_date_alongside_bad_time() {
        let form = AppointmentForm {
            date: "2026-10-01".into(),
            time: "17:00".into(),
        };
        let errors = form.validate(today()).expect_err("two problems");
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["appointmentDate", "appointmentTime"]);
    }

    #[test]
    fn form_validates() {
        let form = AppointmentForm {
            date: "2026-10-20".into(),
            time: "14:00".into(),
        };
        let appointment = form.validate(today()).expect("valid form");
        assert_eq!(appointment.time, TimeSlot::H14);
    }

    #[test]
    fn slot_serializes_as_clock_time() {
        let json = serde_json::to_string(&TimeSlot::H09).expect("serialize");
        assert_eq!(json, "\"09:00\"");
        let slot: TimeSlot = serde_json::from_str("\"15:00\"").expect("deserialize");
        assert_eq!(slot, TimeSlot::H15);
    }
}

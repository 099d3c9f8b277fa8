//! Verification payload shown as a QR code on the bill.
//!
//! The payload is a summary of the bill that front-desk staff can scan. It is not signed and
//! proves nothing about where the bill came from.

use crate::billing::Bill;
use crate::{BookingError, BookingResult};
use bloodtest_verification::{QrOptions, VerificationCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationPayload {
    pub bill_number: String,
    pub patient_name: String,
    pub total_amount: Decimal,
    pub generated_at: DateTime<Utc>,
    pub tests: Vec<String>,
}

impl VerificationPayload {
    pub fn from_bill(bill: &Bill) -> Self {
        Self {
            bill_number: bill.bill_number().to_string(),
            patient_name: bill.patient_info().name.to_string(),
            total_amount: bill.totals().total,
            generated_at: bill.generated_at(),
            tests: bill
                .selected_tests()
                .tests()
                .iter()
                .map(|t| t.name.clone())
                .collect(),
        }
    }

    pub fn to_json(&self) -> BookingResult<String> {
        serde_json::to_string(self).map_err(|source| BookingError::Serialization {
            key: "verificationPayload",
            source,
        })
    }
}

/// Renders the bill's QR image.
///
/// Failure is not fatal to the bill view: it is logged and `None` is returned so the rest of
/// the bill can still be shown.
pub fn render_verification_code(bill: &Bill, options: &QrOptions) -> Option<VerificationCode> {
    let payload = match VerificationPayload::from_bill(bill).to_json() {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(
                "failed to build verification payload for {}: {}",
                bill.bill_number(),
                e
            );
            return None;
        }
    };

    match VerificationCode::encode(&payload, options) {
        Ok(code) => Some(code),
        Err(e) => {
            tracing::warn!("error generating QR code for {}: {}", bill.bill_number(), e);
            None
        }
    }
}

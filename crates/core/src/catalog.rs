//! The clinic's fixed test catalog.
//!
//! The catalog is static reference data: entries are never created or removed at runtime, and
//! every selection or bill refers back to them by id.

use crate::{BookingError, BookingResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One orderable blood test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodTest {
    pub id: u32,
    pub name: String,
    pub price: Decimal,
    pub description: String,
}

// (id, name, price in whole rupees, description)
const STANDARD_ENTRIES: [(u32, &str, i64, &str); 9] = [
    (
        1,
        "Complete Blood Count (CBC)",
        25,
        "Measures different components of blood including red and white blood cells",
    ),
    (
        2,
        "Peripheral Smear",
        35,
        "identify abnormalities like malaria, anemia, or blood cancers.",
    ),
    (
        3,
        "Polymerase Chain Reaction",
        30,
        "Molecular test to detect and amplify DNA/RNA for infections, genetics, and research.",
    ),
    (
        4,
        "DNA/RNA Extraction",
        45,
        "Isolation of genetic material for advanced tests like PCR, sequencing, and diagnostics.",
    ),
    (
        5,
        "HbA1C (Glycated Hemoglobin)",
        40,
        "Checks average blood sugar over 2–3 months to diagnose and monitor diabetes.",
    ),
    (
        6,
        "Erythrocyte Sedimentation Rate (ESR)",
        35,
        "Measures inflammation levels in the body, useful in infections and autoimmune conditions.",
    ),
    (
        7,
        "Blood Grouping (ABO & Rh)",
        50,
        "Identifies blood type and Rh factor, essential for transfusions, transplants, and pregnancy care.",
    ),
    (
        8,
        "Coagulation Profile (PT, INR, PTT)",
        40,
        "Assesses blood clotting function for bleeding disorders, surgeries, and anticoagulant therapy.",
    ),
    (
        9,
        "Antibody Titer",
        55,
        "Measures antibody levels to check immunity, vaccine response, or infections.",
    ),
];

/// Immutable list of tests offered by the clinic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    tests: Vec<BloodTest>,
}

impl Catalog {
    /// The clinic's standard nine-test catalog.
    pub fn standard() -> Self {
        let tests = STANDARD_ENTRIES
            .iter()
            .map(|&(id, name, price, description)| BloodTest {
                id,
                name: name.to_string(),
                price: Decimal::new(price, 0),
                description: description.to_string(),
            })
            .collect();
        Self { tests }
    }

    /// All tests, in display order.
    pub fn tests(&self) -> &[BloodTest] {
        &self.tests
    }

    /// Looks up a test by id.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::UnknownTest` if no entry has that id.
    pub fn find(&self, id: u32) -> BookingResult<&BloodTest> {
        self.tests
            .iter()
            .find(|t| t.id == id)
            .ok_or(BookingError::UnknownTest(id))
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn standard_catalog_has_nine_unique_ids() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.len(), 9);

        let ids: HashSet<u32> = catalog.tests().iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 9);
    }

    #[test]
    fn find_returns_catalog_entry() {
        let catalog = Catalog::standard();
        let hba1c = catalog.find(5).expect("HbA1C exists");
        assert_eq!(hba1c.name, "HbA1C (Glycated Hemoglobin)");
        assert_eq!(hba1c.price, Decimal::new(40, 0));
    }

    #[test]
    fn find_rejects_unknown_id() {
        let err = Catalog::standard().find(42).expect_err("no test 42");
        assert!(matches!(err, BookingError::UnknownTest(42)));
    }

    #[test]
    fn prices_are_positive() {
        assert!(Catalog::standard()
            .tests()
            .iter()
            .all(|t| t.price > Decimal::ZERO));
    }
}

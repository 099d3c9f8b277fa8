//! The patient's selection of tests.

use crate::catalog::{BloodTest, Catalog};
use crate::{BookingError, BookingResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ordered set of tests, unique by id.
///
/// Tests keep the order in which they were added. Removing and re-adding a test moves it to the
/// end, so equality between selections compares membership only (see [`Selection::same_tests`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<BloodTest>", try_from = "Vec<BloodTest>")]
pub struct Selection {
    tests: Vec<BloodTest>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the test when absent, removes it when present.
    ///
    /// Returns `true` if the test is selected after the call.
    pub fn toggle(&mut self, test: &BloodTest) -> bool {
        if let Some(pos) = self.tests.iter().position(|t| t.id == test.id) {
            self.tests.remove(pos);
            false
        } else {
            self.tests.push(test.clone());
            true
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.tests.iter().any(|t| t.id == id)
    }

    /// Sum of the selected tests' prices.
    pub fn total_amount(&self) -> Decimal {
        self.tests.iter().map(|t| t.price).sum()
    }

    pub fn tests(&self) -> &[BloodTest] {
        &self.tests
    }

    pub fn ids(&self) -> Vec<u32> {
        self.tests.iter().map(|t| t.id).collect()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Checks that every selected test is an unmodified entry of `catalog`.
    ///
    /// Selections read back from a session store go through this before they are priced.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::InvalidInput` naming the first test that is unknown or differs
    /// from its catalog entry.
    pub fn verify_against(&self, catalog: &Catalog) -> BookingResult<()> {
        for test in &self.tests {
            let entry = catalog.find(test.id).map_err(|_| {
                BookingError::InvalidInput(format!("test {} is not in the catalog", test.id))
            })?;
            if entry != test {
                return Err(BookingError::InvalidInput(format!(
                    "test {} does not match its catalog entry",
                    test.id
                )));
            }
        }
        Ok(())
    }

    /// Membership comparison that ignores order.
    pub fn same_tests(&self, other: &Selection) -> bool {
        let mut mine = self.ids();
        let mut theirs = other.ids();
        mine.sort_unstable();
        theirs.sort_unstable();
        mine == theirs
    }
}

impl From<Selection> for Vec<BloodTest> {
    fn from(selection: Selection) -> Self {
        selection.tests
    }
}

impl TryFrom<Vec<BloodTest>> for Selection {
    type Error = String;

    fn try_from(tests: Vec<BloodTest>) -> Result<Self, Self::Error> {
        let mut selection = Selection::new();
        for test in &tests {
            if selection.contains(test.id) {
                return Err(format!("duplicate test id {} in selection", test.id));
            }
            selection.tests.push(test.clone());
        }
        Ok(selection)
    }
}

//! Constants used throughout the booking core crate.
//!
//! User-facing copy, money rules, and storage defaults live here so the screens, the
//! printable bill, and the tests agree on them.

/// Prefix of every bill number.
pub const BILL_NUMBER_PREFIX: &str = "BT";

/// Number of trailing millisecond-timestamp digits kept in a bill number.
pub const BILL_NUMBER_DIGITS: usize = 6;

/// Tax applied to the subtotal, in percent.
pub const TAX_RATE_PERCENT: u32 = 8;

/// Decimal places used for tax and totals.
pub const MONEY_SCALE: u32 = 2;

/// Currency symbol prefixed to every displayed amount.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Default directory for the session store when no explicit directory is configured.
pub const DEFAULT_STORE_DIR: &str = ".bloodtest_session";

/// Environment variable naming the session store directory.
pub const STORE_DIR_ENV: &str = "BLOODTEST_STORE_DIR";

/// Extension of session store entry files.
pub const STORE_FILE_EXTENSION: &str = "json";

pub const CLINIC_NAME: &str = "Software Automated Blood Test Center";
pub const CLINIC_TAGLINE: &str = "Blood Testing Services";

pub const EMPTY_SELECTION_MESSAGE: &str = "Please select at least one test to continue.";
pub const BOOKING_ACKNOWLEDGEMENT: &str =
    "Appointment booked successfully! Your bill has been generated.";
pub const PAYMENT_NOTE: &str = "Payment is due at the time of service. We accept cash, credit cards, and most insurance plans.";
pub const QR_CAPTION: &str = "Scan to verify bill authenticity";
pub const THANK_YOU_NOTE: &str = "Thank you for choosing Software Automated Blood Test Center";

pub const SUPPORT_PHONE: &str = "(555) 123-4567";
pub const SUPPORT_EMAIL: &str = "support@bloodtestcenter.com";
pub const OFFICE_HOURS: &str = "Mon-Fri: 8AM-6PM";

use std::fmt::Display;
use std::fs;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bloodtest_core::constants::{CLINIC_NAME, CLINIC_TAGLINE, STORE_DIR_ENV};
use bloodtest_core::render::{bill_text, catalog_text, confirmation_summary_text};
use bloodtest_core::{
    format_money, navigate, route_for, store_dir_from_env_value, Answer, AppointmentForm, Billed,
    Booking, BookingError, Catalog, Clock, ConfirmationForm, Confirming, CoreConfig,
    ExistingPatientLogin, FileStore, LandingChoice, PatientForm, Questioned, Route, Screen,
    Selecting, SessionStore, TimeSlot, CONTACT,
};

/// Line-oriented prompt over any reader and writer.
struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Returns the trimmed reply, or `None` once input is exhausted.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// What a screen hands back: the next screen, or `None` to end the session.
type Step = anyhow::Result<Option<Screen>>;

/// Walks the booking screens until the user quits or input runs out.
fn run_session<R, W, St, C>(
    term: &mut Terminal<R, W>,
    cfg: Arc<CoreConfig>,
    store: &mut St,
    clock: C,
) -> anyhow::Result<()>
where
    R: BufRead,
    W: Write,
    St: SessionStore + ?Sized,
    C: Fn() -> Clock,
{
    let mut screen = navigate(Route::Landing, cfg.clone(), &*store)?;
    loop {
        term.say(format!("\n== {} ==", screen.route().title()))?;
        tracing::debug!("entered {}", screen.route());

        let next = match screen {
            Screen::Landing => landing(term, cfg.clone(), store)?,
            Screen::Selecting(flow) => selecting(term, flow, store)?,
            Screen::Confirming(flow) => confirming(term, flow, store, &clock)?,
            Screen::Billed(flow) => billed(term, flow)?,
            Screen::Questioned(flow) => questioned(term, flow, store, &clock)?,
            Screen::ExistingPatient => existing_patient(term)?,
        };

        match next {
            Some(following) => screen = following,
            None => return Ok(()),
        }
    }
}

fn landing<R, W, St>(term: &mut Terminal<R, W>, cfg: Arc<CoreConfig>, store: &mut St) -> Step
where
    R: BufRead,
    W: Write,
    St: SessionStore + ?Sized,
{
    term.say(format!("{CLINIC_NAME}\n{CLINIC_TAGLINE}\n"))?;
    term.say("1) New patient\n2) Existing patient\nq) Quit")?;
    loop {
        let Some(input) = term.ask("Choose: ")? else {
            return Ok(None);
        };
        let choice = match input.as_str() {
            "1" => LandingChoice::NewPatient,
            "2" => LandingChoice::ExistingPatient,
            "q" => return Ok(None),
            other => {
                term.say(format!("Unrecognised choice: {other}"))?;
                continue;
            }
        };
        let route = route_for(choice, &*store)?;
        return Ok(Some(navigate(route, cfg, &*store)?));
    }
}

fn selecting<R, W, St>(
    term: &mut Terminal<R, W>,
    mut flow: Booking<Selecting>,
    store: &mut St,
) -> Step
where
    R: BufRead,
    W: Write,
    St: SessionStore + ?Sized,
{
    loop {
        term.say(catalog_text(flow.catalog(), flow.selection()))?;
        term.say(format!("Total: {}", format_money(flow.total_amount())))?;

        let Some(input) =
            term.ask("Test number to select or deselect, c to continue, b to go back, q to quit: ")?
        else {
            return Ok(None);
        };
        match input.as_str() {
            "q" => return Ok(None),
            "b" => return Ok(Some(Screen::Landing)),
            "c" => match flow.continue_to_confirmation(store) {
                Ok(next) => return Ok(Some(Screen::Confirming(next))),
                Err(e @ BookingError::EmptySelection) => term.say(e)?,
                Err(e) => return Err(e.into()),
            },
            other => match other.parse::<u32>() {
                Ok(id) => {
                    if let Err(e) = flow.toggle(id) {
                        term.say(e)?;
                    }
                }
                Err(_) => term.say(format!("Unrecognised input: {other}"))?,
            },
        }
    }
}

fn read_confirmation_form<R: BufRead, W: Write>(
    term: &mut Terminal<R, W>,
) -> io::Result<Option<ConfirmationForm>> {
    let slots: Vec<&str> = TimeSlot::ALL.iter().map(|s| s.as_str()).collect();
    let time_prompt = format!("Appointment time ({}): ", slots.join(", "));

    let mut answers = Vec::with_capacity(7);
    for prompt in [
        "Full name: ",
        "Email: ",
        "Phone: ",
        "Date of birth (YYYY-MM-DD): ",
        "Address (optional): ",
        "Appointment date (YYYY-MM-DD): ",
        time_prompt.as_str(),
    ] {
        match term.ask(prompt)? {
            Some(answer) => answers.push(answer),
            None => return Ok(None),
        }
    }

    let mut answers = answers.into_iter();
    let mut next = || answers.next().unwrap_or_default();
    Ok(Some(ConfirmationForm {
        patient: PatientForm {
            name: next(),
            email: next(),
            phone: next(),
            date_of_birth: next(),
            address: next(),
        },
        appointment: AppointmentForm {
            date: next(),
            time: next(),
        },
    }))
}

fn confirming<R, W, St, C>(
    term: &mut Terminal<R, W>,
    flow: Booking<Confirming>,
    store: &mut St,
    clock: &C,
) -> Step
where
    R: BufRead,
    W: Write,
    St: SessionStore + ?Sized,
    C: Fn() -> Clock,
{
    term.say(confirmation_summary_text(flow.selection(), &flow.totals()))?;
    loop {
        let prompt = "Press Enter to fill in your details, b to go back, q to quit: ";
        let Some(input) = term.ask(prompt)? else {
            return Ok(None);
        };
        match input.as_str() {
            "q" => return Ok(None),
            "b" => return Ok(Some(Screen::Selecting(flow.back(Catalog::standard())))),
            _ => {}
        }

        let Some(form) = read_confirmation_form(term)? else {
            return Ok(None);
        };
        match flow.submit(&form, clock(), store) {
            Ok(submitted) => {
                term.say(submitted.acknowledgement)?;
                return Ok(Some(Screen::Billed(submitted.flow)));
            }
            Err(BookingError::InvalidForm(errors)) => {
                term.say("Please correct the following:")?;
                for error in errors {
                    term.say(format!("  {error}"))?;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn billed<R: BufRead, W: Write>(term: &mut Terminal<R, W>, flow: Booking<Billed>) -> Step {
    let view = flow.view();
    term.say(bill_text(&view.bill))?;
    match &view.verification_code {
        Some(code) => term.say(format!(
            "Verification QR code ready ({0}x{0} PNG, {1} bytes)",
            code.edge(),
            code.png_bytes().len()
        ))?,
        None => term.say("Verification QR code unavailable")?,
    }

    loop {
        let prompt = "p to print, n to continue to the questionnaire, b back to home, q to quit: ";
        let Some(input) = term.ask(prompt)? else {
            return Ok(None);
        };
        match input.as_str() {
            "q" => return Ok(None),
            "b" => return Ok(Some(Screen::Landing)),
            "n" => return Ok(Some(Screen::Questioned(flow.proceed()))),
            "p" => {
                let dir = flow.config().store_dir();
                let path = dir.join(format!("bill-{}.html", flow.bill().bill_number()));
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
                fs::write(&path, flow.print())
                    .with_context(|| format!("writing {}", path.display()))?;
                tracing::info!("printable bill written to {}", path.display());
                term.say(format!("Printable bill written to {}", path.display()))?;
            }
            other => term.say(format!("Unrecognised input: {other}"))?,
        }
    }
}

fn questioned<R, W, St, C>(
    term: &mut Terminal<R, W>,
    mut flow: Booking<Questioned>,
    store: &mut St,
    clock: &C,
) -> Step
where
    R: BufRead,
    W: Write,
    St: SessionStore + ?Sized,
    C: Fn() -> Clock,
{
    for question in flow.questions() {
        loop {
            let prompt = format!("{}. {} (yes/no): ", question.id, question.text);
            let Some(input) = term.ask(&prompt)? else {
                return Ok(None);
            };
            match input.parse::<Answer>() {
                Ok(answer) => {
                    flow.answer(question.id, answer)?;
                    break;
                }
                Err(e) => term.say(e)?,
            }
        }
    }

    let record = flow.submit(clock(), store)?;
    term.say(format!(
        "Thank you. Your answers have been saved with bill #{}.",
        record.bill_number
    ))?;
    Ok(Some(Screen::Landing))
}

fn existing_patient<R: BufRead, W: Write>(term: &mut Terminal<R, W>) -> Step {
    let Some(patient_id_or_email) = term.ask("Patient ID or email: ")? else {
        return Ok(None);
    };
    let Some(date_of_birth) = term.ask("Date of birth (YYYY-MM-DD): ")? else {
        return Ok(None);
    };

    let login = ExistingPatientLogin {
        patient_id_or_email,
        date_of_birth,
    };
    if let Err(e) = login.submit() {
        term.say(e)?;
    }
    term.say(format!(
        "Need help?\n  Phone: {}\n  Email: {}\n  Hours: {}",
        CONTACT.phone, CONTACT.email, CONTACT.hours
    ))?;
    Ok(Some(Screen::Landing))
}

/// Interactive booking session on the terminal.
///
/// # Environment Variables
/// - `BLOODTEST_STORE_DIR`: session store directory (default: ".bloodtest_session")
/// - `RUST_LOG`: log filter, logs go to stderr
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bloodtest_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let store_dir = store_dir_from_env_value(std::env::var(STORE_DIR_ENV).ok());
    let cfg = Arc::new(CoreConfig::new(store_dir)?);
    tracing::info!("++ Starting booking session, store at {}", cfg.store_dir().display());

    let mut store = FileStore::new(cfg.store_dir());
    let stdin = io::stdin();
    let mut term = Terminal::new(stdin.lock(), io::stdout());
    run_session(&mut term, cfg, &mut store, Clock::system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodtest_core::{MemoryStore, QuestionnaireRecord, StoreKey};
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn clock() -> Clock {
        Clock::fixed(
            Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0)
                .single()
                .expect("valid timestamp"),
            NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date"),
        )
    }

    fn run(script: &str, temp: &TempDir, store: &mut MemoryStore) -> String {
        let cfg = Arc::new(CoreConfig::new(temp.path().to_path_buf()).expect("valid config"));
        let mut output = Vec::new();
        {
            let mut term = Terminal::new(Cursor::new(script.as_bytes().to_vec()), &mut output);
            run_session(&mut term, cfg, store, clock).expect("session runs");
        }
        String::from_utf8(output).expect("utf8 output")
    }

    const DETAILS: &str =
        "Asha Rao\nasha@example.com\n9876543210\n1990-04-12\n\n2026-10-20\n09:00\n";

    #[test]
    fn full_booking_session() {
        let temp = TempDir::new().expect("tempdir");
        let mut store = MemoryStore::new();
        let script = format!("1\nc\n1\n5\nc\n\n{DETAILS}p\nn\nyes\nmaybe\nno\nno\nno\nno\nno\nq\n");

        let out = run(&script, &temp, &mut store);

        assert!(out.contains("Please select at least one test to continue."));
        assert!(out.contains("Payment is due at the time of service."));
        assert!(out.contains("Appointment booked successfully! Your bill has been generated."));
        assert!(out.contains("₹70.20"));
        assert!(out.contains("Verification QR code ready"));
        assert!(out.contains("invalid answer 'maybe'"));
        assert!(out.contains("Your answers have been saved"));

        let record: QuestionnaireRecord = serde_json::from_str(
            &store
                .read(StoreKey::QuestionnaireAnswers)
                .expect("read")
                .expect("saved"),
        )
        .expect("valid record");
        assert!(record.answers.is_complete());

        let printed = fs::read_dir(temp.path())
            .expect("store dir")
            .filter_map(Result::ok)
            .any(|entry| entry.file_name().to_string_lossy().starts_with("bill-BT"));
        assert!(printed);
    }

    #[test]
    fn invalid_details_are_reported_and_asked_again() {
        let temp = TempDir::new().expect("tempdir");
        let mut store = MemoryStore::new();
        let bad = "Asha Rao\nnot-an-email\n9876543210\n1990-04-12\n\n2026-10-01\n17:00\n";
        let script = format!("1\n2\nc\n\n{bad}\n{DETAILS}q\n");

        let out = run(&script, &temp, &mut store);

        assert!(out.contains("Please correct the following:"));
        assert!(out.contains("  email: "));
        assert!(out.contains("  appointmentDate: "));
        assert!(out.contains("  appointmentTime: "));
        assert!(out.contains("Appointment booked successfully!"));
        assert!(store.read(StoreKey::CurrentBill).expect("read").is_some());
    }

    #[test]
    fn back_from_confirmation_keeps_selection() {
        let temp = TempDir::new().expect("tempdir");
        let mut store = MemoryStore::new();

        let out = run("1\n3\nc\nb\nq\n", &temp, &mut store);

        let reselected = out
            .rsplit("== New Patient Registration ==")
            .next()
            .expect("selector shown twice");
        assert!(reselected.contains("[x]  3. Polymerase Chain Reaction"));
    }

    #[test]
    fn existing_patient_without_bill_gets_contact_details() {
        let temp = TempDir::new().expect("tempdir");
        let mut store = MemoryStore::new();

        let out = run("2\nasha@example.com\n1990-04-12\nq\n", &temp, &mut store);

        assert!(out.contains("== Existing Patient =="));
        assert!(out.contains("online login is not available yet"));
        assert!(out.contains("Phone: (555) 123-4567"));
        assert!(out.contains("Email: support@bloodtestcenter.com"));
    }

    #[test]
    fn existing_patient_with_bill_goes_to_bill() {
        let temp = TempDir::new().expect("tempdir");
        let mut store = MemoryStore::new();
        run(&format!("1\n9\nc\n\n{DETAILS}q\n"), &temp, &mut store);

        let out = run("2\nq\n", &temp, &mut store);

        assert!(out.contains("== Your Bill =="));
        assert!(out.contains("Antibody Titer"));
        assert!(!out.contains("== Existing Patient =="));
    }

    #[test]
    fn bill_screen_returns_home() {
        let temp = TempDir::new().expect("tempdir");
        let mut store = MemoryStore::new();
        let script = format!("1\n1\nc\n\n{DETAILS}b\nq\n");

        let out = run(&script, &temp, &mut store);

        let after_bill = out.rsplit("== Your Bill ==").next().expect("bill shown");
        assert!(after_bill.contains("== Welcome =="));
        assert!(!after_bill.contains("== Pre-Visit Questionnaire =="));
        assert!(store.read(StoreKey::CurrentBill).expect("read").is_some());
    }

    #[test]
    fn session_ends_when_input_runs_out() {
        let temp = TempDir::new().expect("tempdir");
        let mut store = MemoryStore::new();
        let out = run("1\n4\n", &temp, &mut store);
        assert!(out.contains("Total: ₹45.00"));
    }
}

use anyhow::Context;
use bloodtest_core::constants::{CLINIC_NAME, CLINIC_TAGLINE, STORE_DIR_ENV};
use bloodtest_core::render::{bill_text, catalog_text, confirmation_summary_text};
use bloodtest_core::{
    navigate, reset_session, route_for, store_dir_from_env_value, Answer, AppointmentForm, Booking,
    Catalog, Clock, ConfirmationForm, CoreConfig, ExistingPatientLogin, FileStore, LandingChoice,
    PatientForm, Questioned, Route, Screen, Selection, TimeSlot, CONTACT,
};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "bloodtest")]
#[command(about = "Blood test booking CLI")]
struct Cli {
    /// Session store directory (defaults to $BLOODTEST_STORE_DIR, then .bloodtest_session)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the available blood tests
    Catalog,
    /// Select tests by id and continue to confirmation
    Select {
        /// Catalog ids; repeating an id deselects it
        ids: Vec<u32>,
    },
    /// Show the selected tests with totals
    Summary,
    /// Submit patient details and an appointment slot, generating the bill
    Confirm {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: String,
        #[arg(long)]
        address: Option<String>,
        /// Appointment date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Appointment time, 08:00 to 16:00 on the hour
        #[arg(long)]
        time: String,
    },
    /// Show the current bill
    Bill {
        /// Write the printable HTML bill to this path
        #[arg(long)]
        html: Option<PathBuf>,
        /// Write the verification QR code PNG to this path
        #[arg(long)]
        qr: Option<PathBuf>,
    },
    /// Show the screening questions, or submit answers for the current bill
    Questions {
        /// Answer as ID=yes|no, one per question
        #[arg(long = "answer", value_parser = parse_answer)]
        answers: Vec<(u8, Answer)>,
    },
    /// Show where the landing page leads
    Landing {
        /// Choose "existing patient" instead of "new patient"
        #[arg(long)]
        existing: bool,
    },
    /// Existing-patient login
    Login {
        /// Patient ID or email
        #[arg(long)]
        id: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: String,
    },
    /// Clear the session
    Reset,
}

fn parse_answer(raw: &str) -> Result<(u8, Answer), String> {
    let (id, answer) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=yes|no, got '{raw}'"))?;
    let id = id
        .trim()
        .parse::<u8>()
        .map_err(|e| format!("invalid question id '{id}': {e}"))?;
    let answer = answer.parse::<Answer>().map_err(|e| e.to_string())?;
    Ok((id, answer))
}

/// Prints the screen a redirect landed on.
fn show_screen(screen: &Screen, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "== {} ==", screen.route().title())?;
    match screen {
        Screen::Landing => {
            writeln!(out, "{CLINIC_NAME}")?;
            writeln!(out, "{CLINIC_TAGLINE}")?;
            writeln!(out)?;
            writeln!(out, "New patient:      bloodtest select <ids>")?;
            writeln!(out, "Existing patient: bloodtest landing --existing")?;
        }
        Screen::Selecting(selector) => {
            write!(out, "{}", catalog_text(selector.catalog(), selector.selection()))?;
            writeln!(out)?;
            writeln!(out, "Choose tests with: bloodtest select <ids>")?;
        }
        Screen::Confirming(confirming) => write!(
            out,
            "{}",
            confirmation_summary_text(confirming.selection(), &confirming.totals())
        )?,
        Screen::Billed(billed) => write!(out, "{}", bill_text(billed.bill()))?,
        Screen::Questioned(questioned) => write_questions(questioned, out)?,
        Screen::ExistingPatient => write_contact(out)?,
    }
    Ok(())
}

fn write_questions(questioned: &Booking<Questioned>, out: &mut impl Write) -> anyhow::Result<()> {
    for q in questioned.questions() {
        let current = questioned
            .answers()
            .get(q.id)
            .map_or("-", Answer::as_str);
        writeln!(out, "{}. {} [{}]", q.id, q.text, current)?;
    }
    Ok(())
}

fn write_contact(out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "Phone: {}", CONTACT.phone)?;
    writeln!(out, "Email: {}", CONTACT.email)?;
    writeln!(out, "Hours: {}", CONTACT.hours)?;
    Ok(())
}

fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let store_dir = cli
        .store_dir
        .unwrap_or_else(|| store_dir_from_env_value(std::env::var(STORE_DIR_ENV).ok()));
    let cfg = Arc::new(CoreConfig::new(store_dir)?);
    let mut store = FileStore::new(cfg.store_dir());
    tracing::debug!("using session store at {}", cfg.store_dir().display());

    match cli.command {
        Some(Commands::Catalog) => {
            write!(out, "{}", catalog_text(&Catalog::standard(), &Selection::new()))?;
        }
        Some(Commands::Select { ids }) => {
            let mut selector = Booking::new(cfg.clone(), Catalog::standard());
            for id in ids {
                selector.toggle(id)?;
            }
            let confirming = selector.continue_to_confirmation(&mut store)?;
            write!(
                out,
                "{}",
                confirmation_summary_text(confirming.selection(), &confirming.totals())
            )?;
        }
        Some(Commands::Summary) => {
            let confirming = match navigate(Route::Confirmation, cfg.clone(), &store)? {
                Screen::Confirming(confirming) => confirming,
                landed => return show_screen(&landed, out),
            };
            write!(
                out,
                "{}",
                confirmation_summary_text(confirming.selection(), &confirming.totals())
            )?;
            writeln!(out)?;
            let slots: Vec<String> = TimeSlot::ALL.iter().map(|s| s.label()).collect();
            writeln!(out, "Available times: {}", slots.join(", "))?;
        }
        Some(Commands::Confirm {
            name,
            email,
            phone,
            dob,
            address,
            date,
            time,
        }) => {
            let confirming = match navigate(Route::Confirmation, cfg.clone(), &store)? {
                Screen::Confirming(confirming) => confirming,
                landed => return show_screen(&landed, out),
            };
            let form = ConfirmationForm {
                patient: PatientForm {
                    name,
                    email,
                    phone,
                    date_of_birth: dob,
                    address: address.unwrap_or_default(),
                },
                appointment: AppointmentForm { date, time },
            };
            let submitted = confirming.submit(&form, Clock::system(), &mut store)?;
            writeln!(out, "{}", submitted.acknowledgement)?;
            writeln!(out, "Bill #{}", submitted.flow.bill().bill_number())?;
        }
        Some(Commands::Bill { html, qr }) => {
            let billed = match navigate(Route::Bill, cfg.clone(), &store)? {
                Screen::Billed(billed) => billed,
                landed => return show_screen(&landed, out),
            };
            write!(out, "{}", bill_text(billed.bill()))?;

            if let Some(path) = html {
                fs::write(&path, billed.print())
                    .with_context(|| format!("writing bill to {}", path.display()))?;
                writeln!(out, "Wrote printable bill to {}", path.display())?;
            }
            if let Some(path) = qr {
                match billed.view().verification_code {
                    Some(code) => {
                        fs::write(&path, code.png_bytes())
                            .with_context(|| format!("writing QR code to {}", path.display()))?;
                        writeln!(out, "Wrote verification QR code to {}", path.display())?;
                    }
                    None => eprintln!("QR code could not be generated for this bill"),
                }
            }
        }
        Some(Commands::Questions { answers }) => {
            let mut questioned = match navigate(Route::Questions, cfg.clone(), &store)? {
                Screen::Questioned(questioned) => questioned,
                landed => return show_screen(&landed, out),
            };
            if answers.is_empty() {
                write_questions(&questioned, out)?;
            } else {
                for (id, answer) in answers {
                    questioned.answer(id, answer)?;
                }
                let record = questioned.submit(Clock::system(), &mut store)?;
                writeln!(out, "Answers saved for bill #{}", record.bill_number)?;
            }
        }
        Some(Commands::Landing { existing }) => {
            let choice = if existing {
                LandingChoice::ExistingPatient
            } else {
                LandingChoice::NewPatient
            };
            let route = route_for(choice, &store)?;
            writeln!(out, "{} ({})", route.title(), route.path())?;
        }
        Some(Commands::Login { id, dob }) => {
            let login = ExistingPatientLogin {
                patient_id_or_email: id,
                date_of_birth: dob,
            };
            if let Err(e) = login.submit() {
                eprintln!("{e}");
                write_contact(out)?;
            }
        }
        Some(Commands::Reset) => {
            reset_session(&mut store)?;
            writeln!(out, "Session cleared.")?;
        }
        None => {
            writeln!(out, "Use --help to see available commands.")?;
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bloodtest_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse(), &mut std::io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_answer_accepts_id_and_value() {
        assert_eq!(parse_answer("3=yes").expect("valid"), (3, Answer::Yes));
        assert_eq!(parse_answer("6= N").expect("valid"), (6, Answer::No));
    }

    #[test]
    fn parse_answer_rejects_malformed_input() {
        assert!(parse_answer("3").is_err());
        assert!(parse_answer("x=yes").is_err());
        assert!(parse_answer("1=maybe").is_err());
    }

    #[test]
    fn confirm_requires_appointment_fields() {
        let err = Cli::try_parse_from([
            "bloodtest", "confirm", "--name", "A", "--email", "a@b.c", "--phone", "1", "--dob",
            "1990-01-01",
        ])
        .expect_err("missing date and time");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn store_dir_flag_is_global() {
        let cli = Cli::try_parse_from(["bloodtest", "bill", "--store-dir", "/tmp/session"])
            .expect("valid args");
        assert_eq!(cli.store_dir, Some(PathBuf::from("/tmp/session")));
    }

    fn run_in(dir: &std::path::Path, args: &[&str]) -> anyhow::Result<String> {
        let mut argv = vec!["bloodtest", "--store-dir"];
        argv.push(dir.to_str().expect("utf-8 temp path"));
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("valid args");
        let mut out = Vec::new();
        run(cli, &mut out)?;
        Ok(String::from_utf8(out).expect("utf-8 output"))
    }

    #[test]
    fn bill_without_a_bill_lands_on_welcome() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = run_in(dir.path(), &["bill"]).expect("redirect is not an error");
        assert!(out.starts_with("== Welcome =="));
        assert!(out.contains(CLINIC_NAME));
        assert!(!out.contains("Bill #"));
    }

    #[test]
    fn summary_without_a_selection_lands_on_the_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = run_in(dir.path(), &["summary"]).expect("redirect is not an error");
        assert!(out.starts_with("== New Patient Registration =="));
        assert!(out.contains("Complete Blood Count (CBC)"));
        assert!(!out.contains("Available times"));
    }

    #[test]
    fn questions_without_a_bill_lands_on_welcome() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = run_in(dir.path(), &["questions"]).expect("redirect is not an error");
        assert!(out.starts_with("== Welcome =="));
    }

    #[test]
    fn select_then_summary_shows_totals() {
        let dir = tempfile::tempdir().expect("tempdir");
        run_in(dir.path(), &["select", "1", "5"]).expect("select");
        let out = run_in(dir.path(), &["summary"]).expect("summary");
        assert!(out.starts_with("Selected Tests"));
        assert!(out.contains("₹70.20"));
        assert!(out.contains("Available times: 8:00 AM"));
    }

    #[test]
    fn unknown_test_id_is_still_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(run_in(dir.path(), &["select", "42"]).is_err());
    }
}

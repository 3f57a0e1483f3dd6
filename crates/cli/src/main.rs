use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use api_client::RestClient;
use clap::{Parser, Subcommand};
use psyrec_core::config::{cr_debounce_from_env_value, timeout_from_env_value};
use psyrec_core::constants::DOCTOR_PAGE_LIMIT;
use psyrec_core::draft::FieldGroup;
use psyrec_core::{
    CoreConfig, DraftField, DraftStore, FileStore, KeyValueStore, PatientApi, SideEffect, Wizard,
    WizardError, WizardStep, DEFAULT_API_URL, DEFAULT_DATA_DIR,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "psyrec")]
#[command(about = "Psychiatry OPD patient registration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the patient from the out-patient card (step 1)
    Step1 {
        /// Patient name
        #[arg(long)]
        name: Option<String>,
        /// Sex
        #[arg(long)]
        sex: Option<String>,
        /// Age in years
        #[arg(long)]
        age: Option<String>,
        /// CR number
        #[arg(long)]
        cr_no: Option<String>,
        /// Any other field, as field=value (see `psyrec fields`)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
    },
    /// Complete the registration with demographic and social details (step 2)
    Step2 {
        /// Doctor id to assign the patient to (see `psyrec doctors`)
        #[arg(long)]
        doctor: Option<String>,
        /// Room number for the assignment
        #[arg(long)]
        room: Option<String>,
        /// Any other field, as field=value (see `psyrec fields`)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
    },
    /// Show the registration in progress, if any
    Status,
    /// Abandon the registration in progress
    Cancel,
    /// Check whether a CR number is already registered
    CheckCr {
        /// CR number to look up
        cr_no: String,
    },
    /// List doctors available for assignment
    Doctors {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DOCTOR_PAGE_LIMIT)]
        limit: u32,
    },
    /// List the field names accepted by --set
    Fields,
}

/// Entry point for the registration CLI.
///
/// # Environment Variables
/// - `PSYREC_API_URL`: backend base URL (default: "http://localhost:5000")
/// - `PSYREC_API_TOKEN`: bearer token sent with every request (optional)
/// - `PSYREC_TIMEOUT_SECS`: request timeout in seconds (default: 30)
/// - `PSYREC_DATA_DIR`: directory holding the resume checkpoint (default: ".psyrec")
/// - `PSYREC_CR_DEBOUNCE_MS`: quiet period before a CR number is checked (default: 500)
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("psyrec_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Commands::Fields = cli.command {
        print_fields();
        return Ok(());
    }

    let cfg = load_config()?;
    tracing::debug!(
        api = cfg.api_base_url(),
        data_dir = %cfg.data_dir().display(),
        "configuration loaded"
    );
    let client = RestClient::new(&cfg).context("failed to create API client")?;
    let store = FileStore::open(cfg.data_dir())?;
    let mut wizard = Wizard::mount(client, store, DraftStore::new(), cfg.cr_debounce())?;

    match cli.command {
        Commands::Step1 {
            name,
            sex,
            age,
            cr_no,
            set,
        } => {
            let mut fields = parse_assignments(&set)?;
            for (field, value) in [
                (DraftField::Name, name),
                (DraftField::Sex, sex),
                (DraftField::Age, age),
                (DraftField::CrNo, cr_no),
            ] {
                if let Some(value) = value {
                    fields.push((field, value));
                }
            }
            step_one(&mut wizard, &cfg, fields)
        }
        Commands::Step2 { doctor, room, set } => {
            let mut fields = parse_assignments(&set)?;
            if let Some(doctor) = doctor {
                fields.push((DraftField::AssignedDoctor, doctor));
            }
            if let Some(room) = room {
                fields.push((DraftField::AssignedRoom, room));
            }
            step_two(&mut wizard, fields)
        }
        Commands::Status => {
            match wizard.patient_id() {
                Some(id) => println!(
                    "Registration in progress for patient {id} (step {})",
                    wizard.step().number()
                ),
                None => println!("No registration in progress."),
            }
            Ok(())
        }
        Commands::Cancel => {
            wizard.cancel()?;
            println!("Registration cancelled.");
            Ok(())
        }
        Commands::CheckCr { cr_no } => {
            wizard.input_cr_number(&cr_no, Instant::now());
            if !wizard.poll_cr_check(Instant::now() + cfg.cr_debounce()) {
                bail!("CR number is too short to check");
            }
            match wizard.cr_error() {
                Some(message) => println!("{message}"),
                None => println!("CR number {} is available.", cr_no.trim()),
            }
            Ok(())
        }
        Commands::Doctors { page, limit } => {
            let doctors = wizard.doctors(page, limit)?;
            if doctors.is_empty() {
                println!("No doctors found.");
            }
            for doctor in doctors {
                println!("ID: {}, Name: {}, Role: {}", doctor.id, doctor.name, doctor.role);
            }
            Ok(())
        }
        Commands::Fields => Ok(()),
    }
}

fn load_config() -> anyhow::Result<CoreConfig> {
    let api_url = std::env::var("PSYREC_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
    let token = std::env::var("PSYREC_API_TOKEN").ok();
    let timeout = timeout_from_env_value(std::env::var("PSYREC_TIMEOUT_SECS").ok())?;
    let data_dir = std::env::var("PSYREC_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
    let debounce = cr_debounce_from_env_value(std::env::var("PSYREC_CR_DEBOUNCE_MS").ok())?;

    Ok(CoreConfig::new(api_url, token, timeout, data_dir, debounce)?)
}

/// Parses `field=value` pairs. Choice fields are ordered before their free-text
/// companions so an "other" override is never dropped.
fn parse_assignments(raw: &[String]) -> anyhow::Result<Vec<(DraftField, String)>> {
    let mut fields = Vec::with_capacity(raw.len());
    for item in raw {
        let Some((name, value)) = item.split_once('=') else {
            bail!("expected FIELD=VALUE, got {item:?}");
        };
        let Some(field) = DraftField::from_name(name.trim()) else {
            bail!("unknown field {:?} (run `psyrec fields`)", name.trim());
        };
        fields.push((field, value.to_string()));
    }
    fields.sort_by_key(|(field, _)| field.group() == FieldGroup::OtherOverride);
    Ok(fields)
}

fn step_one<A: PatientApi, S: KeyValueStore>(
    wizard: &mut Wizard<A, S>,
    cfg: &CoreConfig,
    fields: Vec<(DraftField, String)>,
) -> anyhow::Result<()> {
    if let Some(id) = wizard.patient_id() {
        bail!("patient {id} is already waiting for step 2; run `psyrec step2` or `psyrec cancel`");
    }
    for (field, value) in &fields {
        wizard.set_field(*field, value);
    }
    // A one-shot invocation has no further keystrokes, so the quiet period is already over.
    wizard.poll_cr_check(Instant::now() + cfg.cr_debounce());

    match wizard.submit_step_one() {
        Ok(id) => {
            println!("Created patient {id}. Continue with `psyrec step2`.");
            Ok(())
        }
        Err(e) => report(wizard, e),
    }
}

fn step_two<A: PatientApi, S: KeyValueStore>(
    wizard: &mut Wizard<A, S>,
    fields: Vec<(DraftField, String)>,
) -> anyhow::Result<()> {
    if wizard.step() != WizardStep::Two {
        bail!("no registration in progress; start with `psyrec step1`");
    }
    for (field, value) in &fields {
        wizard.set_field(*field, value);
    }

    let outcome = match wizard.submit_step_two() {
        Ok(outcome) => outcome,
        Err(e) => return report(wizard, e),
    };
    println!("Registration complete for patient {}.", outcome.patient_id);
    if let SideEffect::Failed(e) = &outcome.assignment {
        eprintln!("Warning: doctor assignment failed: {}", e.user_message());
    }
    if let SideEffect::Failed(e) = &outcome.visit {
        eprintln!("Warning: first visit was not recorded: {}", e.user_message());
    }
    if !outcome.checkpoint_cleared {
        eprintln!("Warning: could not clear the saved progress; run `psyrec cancel`");
    }
    Ok(())
}

fn report<A: PatientApi, S: KeyValueStore>(
    wizard: &Wizard<A, S>,
    err: WizardError,
) -> anyhow::Result<()> {
    for (field, message) in wizard.field_errors().iter() {
        eprintln!("  {field}: {message}");
    }
    Err(err.into())
}

fn print_fields() {
    for (group, title) in [
        (FieldGroup::IdentityContact, "Out-patient card (step 1)"),
        (FieldGroup::DemographicSocial, "Demographic and social details (step 2)"),
        (FieldGroup::OtherOverride, "Free text for \"other\" choices"),
    ] {
        println!("{title}:");
        for field in DraftField::ALL.iter().filter(|f| f.group() == group) {
            println!("  {field}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignments_orders_companions_last() {
        let raw = vec![
            "occupation_other=Potter".to_string(),
            "occupation=others".to_string(),
            "religion=Hindu".to_string(),
        ];
        let fields = parse_assignments(&raw).unwrap();
        assert_eq!(fields.last().unwrap().0, DraftField::OccupationOther);
        assert_eq!(fields[0], (DraftField::Occupation, "others".to_string()));
    }

    #[test]
    fn test_parse_assignments_rejects_unknown_field() {
        let err = parse_assignments(&["shoe_size=9".to_string()]).unwrap_err();
        assert!(err.to_string().contains("shoe_size"));
    }

    #[test]
    fn test_parse_assignments_requires_equals() {
        assert!(parse_assignments(&["name".to_string()]).is_err());
    }

    #[test]
    fn test_cli_parses_step_one_flags() {
        let cli = Cli::try_parse_from([
            "psyrec", "step1", "--name", "Asha", "--cr-no", "CR100", "--set", "city=Delhi",
        ])
        .unwrap();
        match cli.command {
            Commands::Step1 { name, cr_no, set, .. } => {
                assert_eq!(name.as_deref(), Some("Asha"));
                assert_eq!(cr_no.as_deref(), Some("CR100"));
                assert_eq!(set, vec!["city=Delhi".to_string()]);
            }
            _ => panic!("expected step1"),
        }
    }
}

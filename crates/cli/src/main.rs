use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cmf_core::appointment::AppointmentForm;
use cmf_core::catalog::Catalogs;
use cmf_core::intake::HttpIntakeClient;
use cmf_core::prescription::PrescriptionForm;
use cmf_core::profile::RawProfileRecord;
use cmf_core::submission::{FormController, IntakeForm, RequestState};
use cmf_core::{reconcile_raw, CoreConfig, IdentityHints, NormalizedPatient};

#[derive(Parser)]
#[command(name = "cmf")]
#[command(about = "CMF patient portal CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Where the patient identity for a command comes from.
#[derive(clap::Args)]
struct PatientArgs {
    /// Stored profile document (any schema generation)
    #[arg(long)]
    profile: Option<PathBuf>,
    /// Session email, used when the profile has none
    #[arg(long)]
    email: Option<String>,
    /// Session display name, split into first and last name when the profile has none
    #[arg(long)]
    display_name: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a stored profile document into the normalized patient
    Reconcile {
        /// Profile document (JSON object)
        profile: PathBuf,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Report which medication rows of a prescription form are incomplete
    CheckPrescription {
        /// Prescription form (JSON)
        form: PathBuf,
    },
    /// Report whether an appointment form can be submitted
    CheckAppointment {
        /// Appointment form (JSON)
        form: PathBuf,
        #[command(flatten)]
        patient: PatientArgs,
    },
    /// Send a prescription request to the intake API
    SubmitPrescription {
        /// Prescription form (JSON)
        form: PathBuf,
        #[command(flatten)]
        patient: PatientArgs,
    },
    /// Send an appointment request to the intake API
    SubmitAppointment {
        /// Appointment form (JSON)
        form: PathBuf,
        #[command(flatten)]
        patient: PatientArgs,
    },
    /// Print every selectable option list
    Catalogs,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn read_profile(path: &Path) -> anyhow::Result<RawProfileRecord> {
    match read_json::<Value>(path)? {
        Value::Object(record) => Ok(record),
        _ => anyhow::bail!("{} is not a JSON object", path.display()),
    }
}

fn resolve_patient(args: &PatientArgs) -> anyhow::Result<NormalizedPatient> {
    let raw = args.profile.as_deref().map(read_profile).transpose()?;
    let hints = IdentityHints::new(args.email.as_deref(), args.display_name.as_deref());
    Ok(reconcile_raw(raw.as_ref(), &hints))
}

fn patient_json(patient: &NormalizedPatient) -> Value {
    json!({
        "patient": patient,
        "identityLine": patient.identity_line(),
        "coverageLine": patient.coverage_line(),
    })
}

fn prescription_report(form: &PrescriptionForm) -> Value {
    let incomplete: Vec<Value> = form
        .incomplete_rows()
        .into_iter()
        .map(|(row, missing)| json!({ "row": row + 1, "missing": missing }))
        .collect();
    json!({
        "ready": incomplete.is_empty(),
        "rows": form.medications().len(),
        "incomplete": incomplete,
    })
}

fn print(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn intake_client() -> anyhow::Result<(HttpIntakeClient, CoreConfig)> {
    let cfg = CoreConfig::from_env_values(
        std::env::var("CMF_INTAKE_BASE_URL").ok(),
        std::env::var("CMF_DATA_DIR").ok(),
        std::env::var("CMF_INTAKE_TIMEOUT_SECS").ok(),
        std::env::var("CMF_NOTICE_SECS").ok(),
    )?;
    Ok((HttpIntakeClient::from_config(&cfg)?, cfg))
}

async fn submit<F: IntakeForm>(form: F, patient: &NormalizedPatient) -> anyhow::Result<ExitCode> {
    let (client, cfg) = intake_client()?;
    let mut controller = FormController::new(form, cfg.notice_window());
    let report = controller.submit(&client, Some(patient)).await;

    print(&json!({ "result": report }))?;
    Ok(if report.state == RequestState::Succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn ready_exit(ready: bool) -> ExitCode {
    if ready {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cmf_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Reconcile {
            profile,
            email,
            display_name,
        }) => {
            let patient = resolve_patient(&PatientArgs {
                profile: Some(profile),
                email,
                display_name,
            })?;
            print(&patient_json(&patient))?;
        }
        Some(Commands::CheckPrescription { form }) => {
            let form: PrescriptionForm = read_json(&form)?;
            let report = prescription_report(&form);
            print(&report)?;
            return Ok(ready_exit(form.is_ready(None)));
        }
        Some(Commands::CheckAppointment { form, patient }) => {
            let form: AppointmentForm = read_json(&form)?;
            let has_patient = patient.profile.is_some() || patient.email.is_some();
            let patient = has_patient
                .then(|| resolve_patient(&patient))
                .transpose()?;
            let ready = form.is_ready(patient.as_ref());
            print(&json!({ "ready": ready, "hasPatient": patient.is_some() }))?;
            return Ok(ready_exit(ready));
        }
        Some(Commands::SubmitPrescription { form, patient }) => {
            let form: PrescriptionForm = read_json(&form)?;
            let patient = resolve_patient(&patient)?;
            return submit(form, &patient).await;
        }
        Some(Commands::SubmitAppointment { form, patient }) => {
            let form: AppointmentForm = read_json(&form)?;
            let patient = resolve_patient(&patient)?;
            return submit(form, &patient).await;
        }
        Some(Commands::Catalogs) => {
            print(&serde_json::to_value(Catalogs::standard())?)?;
        }
        None => {
            println!("Use 'cmf --help' for commands");
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reconciles_legacy_profile_with_session_hints() {
        let file = write_temp(r#"{"nombre":"Ana","dni":30111222,"cobertura":"OSDE"}"#);
        let patient = resolve_patient(&PatientArgs {
            profile: Some(file.path().to_path_buf()),
            email: Some("ana@x.com".into()),
            display_name: Some("Ana Gomez".into()),
        })
        .unwrap();

        assert_eq!(patient.first_name, "Ana");
        assert_eq!(patient.last_name, "Gomez");
        assert_eq!(patient.national_id, "30111222");
        assert_eq!(patient.email, "ana@x.com");
    }

    #[test]
    fn profile_must_be_an_object() {
        let file = write_temp("[1, 2]");
        assert!(read_profile(file.path()).is_err());
    }

    #[test]
    fn prescription_report_numbers_rows_from_one() {
        let file = write_temp(
            r#"{"medications":[
                {"commercialName":"Ibuprofeno","dosage":"400mg","pharmaceuticalForm":"Comprimido","monthlyQuantity":"1"},
                {"commercialName":"Otro","dosage":"5mg","pharmaceuticalForm":"Jarabe","monthlyQuantity":"1"}
            ]}"#,
        );
        let form: PrescriptionForm = read_json(file.path()).unwrap();
        let report = prescription_report(&form);

        assert_eq!(report["ready"], false);
        assert_eq!(report["rows"], 2);
        assert_eq!(report["incomplete"][0]["row"], 2);
        assert_eq!(report["incomplete"][0]["missing"], json!(["commercialNameOther"]));
    }

    #[test]
    fn cli_parses_submit_arguments() {
        let cli = Cli::try_parse_from([
            "cmf",
            "submit-appointment",
            "turno.json",
            "--profile",
            "perfil.json",
            "--email",
            "ana@x.com",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::SubmitAppointment { form, patient }) => {
                assert_eq!(form, PathBuf::from("turno.json"));
                assert_eq!(patient.profile, Some(PathBuf::from("perfil.json")));
                assert_eq!(patient.email.as_deref(), Some("ana@x.com"));
            }
            _ => panic!("expected submit-appointment"),
        }
    }
}

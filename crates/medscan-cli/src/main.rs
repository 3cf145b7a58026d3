use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use medscan_ai::assets::{DEFAULT_LABELS_URL, DEFAULT_MODEL_URL};
use medscan_ai::{ClassifierClient, Normalization, OnnxConfig, OnnxLoader, Preprocess, TensorLayout};
use medscan_core::record::report_file_name;
use medscan_core::vitals::NewReading;
use medscan_core::{Presenter, RecordFilter, ScanType, UploadPolicy, VitalKind, VitalLog};
use medscan_sync::{HistoryClient, PredictionUpload};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod display;
mod scan;

#[derive(Parser, Debug)]
#[command(name = "medscan")]
#[command(about = "Medical image screening with a pretrained CNN")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a medical image and print the top findings
    Scan(ScanArgs),
    /// List the supported scan types
    Types,
    /// Check a vital reading against its normal range
    Vitals {
        #[command(subcommand)]
        command: VitalsCommand,
    },
    /// Send an image to the diagnosis service for analysis and storage
    Submit(SubmitArgs),
    /// List stored diagnoses from the history service
    History(HistoryArgs),
    /// Show the patient summary from the history service
    Stats(ApiArgs),
    /// Download the report for one diagnosis
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Image to analyze (JPEG, PNG, BMP, WebP)
    image: PathBuf,

    #[arg(short = 't', long = "type")]
    scan_type: Option<ScanType>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Only accept JPEG, PNG, and DICOM uploads (DICOM is refused before decoding)
    #[arg(long)]
    strict_formats: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Directory holding model.onnx and labels.txt
    #[arg(long, env = "MEDSCAN_MODEL_DIR", default_value = "models/mobilenet-v2")]
    model_dir: PathBuf,

    #[arg(long, env = "MEDSCAN_MODEL_URL", default_value = DEFAULT_MODEL_URL)]
    model_url: String,

    #[arg(long, env = "MEDSCAN_LABELS_URL", default_value = DEFAULT_LABELS_URL)]
    labels_url: String,

    /// Never download missing model files
    #[arg(long)]
    offline: bool,

    #[arg(long, value_enum, default_value_t = NormalizationArg::Imagenet)]
    normalization: NormalizationArg,

    #[arg(long, value_enum, default_value_t = LayoutArg::Nchw)]
    layout: LayoutArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum NormalizationArg {
    Imagenet,
    SignedUnit,
    Unit,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LayoutArg {
    Nchw,
    Nhwc,
}

impl ModelArgs {
    fn onnx_config(&self) -> OnnxConfig {
        let mut config = OnnxConfig::new(&self.model_dir);
        if !self.offline {
            config.model_url = Some(self.model_url.clone());
            config.labels_url = Some(self.labels_url.clone());
        }
        config.preprocess = Preprocess {
            layout: match self.layout {
                LayoutArg::Nchw => TensorLayout::Nchw,
                LayoutArg::Nhwc => TensorLayout::Nhwc,
            },
            normalization: match self.normalization {
                NormalizationArg::Imagenet => Normalization::ImageNet,
                NormalizationArg::SignedUnit => Normalization::SignedUnit,
                NormalizationArg::Unit => Normalization::Unit,
            },
            ..Preprocess::default()
        };
        config
    }
}

#[derive(Subcommand, Debug)]
enum VitalsCommand {
    /// Classify one reading as normal, high, or low
    Check(CheckArgs),
    /// List vital kinds with units and normal ranges
    Kinds,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[arg(short, long)]
    kind: VitalKind,

    /// Primary value (systolic for blood pressure)
    #[arg(short, long, value_parser = finite)]
    value: Option<f64>,

    /// Diastolic value for blood pressure
    #[arg(short, long, value_parser = finite)]
    secondary: Option<f64>,

    /// Earlier readings of the same kind, oldest first; used for the trend
    #[arg(short, long = "previous", value_parser = finite)]
    previous: Vec<f64>,

    /// Free text; required for medication
    #[arg(short, long, default_value = "")]
    notes: String,

    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ApiArgs {
    /// Base URL of the history service
    #[arg(long, env = "MEDSCAN_API_URL", default_value = "http://localhost:3000")]
    api_url: String,
}

impl ApiArgs {
    fn client(&self) -> HistoryClient {
        HistoryClient::new(self.api_url.clone())
    }
}

#[derive(Args, Debug)]
struct SubmitArgs {
    /// JPEG, PNG, or DICOM image
    image: PathBuf,

    /// Service scan type, e.g. chest-xray, skin-lesion, retinal-scan, blood-smear
    #[arg(short = 't', long = "type", default_value = "chest-xray")]
    scan_type: String,

    #[arg(long, default_value = "")]
    symptoms: String,

    #[arg(long)]
    json: bool,

    #[command(flatten)]
    api: ApiArgs,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    #[arg(short = 't', long = "type")]
    scan_type: Option<ScanType>,

    /// Case-insensitive search over diagnosis and scan type
    #[arg(short, long, default_value = "")]
    search: String,

    #[arg(long)]
    json: bool,

    #[command(flatten)]
    api: ApiArgs,
}

#[derive(Args, Debug)]
struct ReportArgs {
    id: String,

    /// Defaults to diagnosis-report-<id>.pdf
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    api: ApiArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout is reserved for results.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medscan=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!("medscan v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Scan(args) => cmd_scan(args).await,
        Command::Types => {
            print!("{}", display::render_scan_types());
            Ok(())
        }
        Command::Vitals { command } => match command {
            VitalsCommand::Check(args) => cmd_vitals_check(args),
            VitalsCommand::Kinds => {
                print!("{}", display::render_kinds());
                Ok(())
            }
        },
        Command::Submit(args) => cmd_submit(args).await,
        Command::History(args) => cmd_history(args).await,
        Command::Stats(api) => {
            let stats = api
                .client()
                .fetch_patient_stats()
                .await
                .context("fetching patient stats")?;
            print!("{}", display::render_stats(&stats));
            Ok(())
        }
        Command::Report(args) => cmd_report(args).await,
    }
}

async fn cmd_scan(args: ScanArgs) -> Result<()> {
    let client = ClassifierClient::new(OnnxLoader::new(args.model.onnx_config()));
    let policy = if args.strict_formats {
        UploadPolicy::scan_formats()
    } else {
        UploadPolicy::any_image()
    };

    let report = scan::run_scan(
        &client,
        &Presenter::default(),
        &policy,
        &args.image,
        args.scan_type,
    )
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", display::render_scan(&report));
    }
    Ok(())
}

/// Reading values must be real numbers; `NaN` would compare as normal.
fn finite(s: &str) -> Result<f64, String> {
    let v: f64 = s.trim().parse().map_err(|e| format!("{e}"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("{s} is not a finite number"))
    }
}

fn cmd_vitals_check(args: CheckArgs) -> Result<()> {
    print!("{}", check_vital(args)?);
    Ok(())
}

/// Record `--previous` readings then the current one, and render the newest.
fn check_vital(args: CheckArgs) -> Result<String> {
    let value = match (args.kind.is_text(), args.value) {
        (true, _) if args.notes.trim().is_empty() => {
            bail!("{} entries need --notes", args.kind.name())
        }
        (true, _) => 0.0,
        (false, Some(v)) => v,
        (false, None) => bail!("{} needs --value", args.kind.name()),
    };

    let now = chrono::Local::now().naive_local();
    let mut log = VitalLog::new();
    let earlier = args.previous.len() as i64;
    for (i, &v) in args.previous.iter().enumerate() {
        log.record(NewReading {
            kind: args.kind,
            value: v,
            secondary: None,
            recorded_at: now - chrono::Duration::hours(earlier - i as i64),
            notes: String::new(),
        });
    }
    let reading = log
        .record(NewReading {
            kind: args.kind,
            value,
            secondary: args.secondary,
            recorded_at: now,
            notes: args.notes,
        })
        .clone();
    let trend = log.trend(args.kind);

    if args.json {
        let body = serde_json::json!({
            "reading": reading,
            "status": reading.status(),
            "trend": trend,
        });
        Ok(format!("{}\n", serde_json::to_string_pretty(&body)?))
    } else {
        Ok(display::render_reading(&reading, trend))
    }
}

/// Apply the patient upload rules, then read the file for sending.
async fn prepare_upload(
    path: &Path,
    scan_type: String,
    symptoms: String,
) -> Result<PredictionUpload> {
    let size = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?
        .len();
    let media_type = UploadPolicy::scan_formats().validate_path(path, size)?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(PredictionUpload {
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        media_type: media_type.to_string(),
        bytes,
        scan_type,
        symptoms,
    })
}

async fn cmd_submit(args: SubmitArgs) -> Result<()> {
    let upload = prepare_upload(&args.image, args.scan_type, args.symptoms).await?;
    let record = args
        .api
        .client()
        .submit_prediction(upload)
        .await
        .context("Analysis failed. Please try again.")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", display::render_record(&record));
    }
    Ok(())
}

async fn cmd_history(args: HistoryArgs) -> Result<()> {
    let records = args
        .api
        .client()
        .fetch_history()
        .await
        .context("fetching diagnosis history")?;

    let filter = RecordFilter {
        scan_type: args.scan_type.map(|t| t.id().to_string()),
        query: args.search,
    };
    let shown = filter.apply(&records);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        print!("{}", display::render_history(&shown));
    }
    Ok(())
}

async fn cmd_report(args: ReportArgs) -> Result<()> {
    let bytes = args
        .api
        .client()
        .download_report(&args.id)
        .await
        .context("downloading report")?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(report_file_name(&args.id)));
    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Saved {} ({} bytes)", output.display(), bytes.len());
    Ok(())
}

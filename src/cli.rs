use std::{env, fs::OpenOptions, path::PathBuf, sync::Mutex, time::Duration};

use clap::{Parser, builder::BoolishValueParser};
use enumset::EnumSet;

use crate::{
    api::{fronius, pvoutput},
    core::{
        aggregate::Aggregation,
        cycle::Settings,
        load::{EnergyFallback, LoadEstimation},
        report::ReportField,
        sample::Estimation,
    },
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[clap(flatten)]
    pub fronius: FroniusArgs,

    #[clap(flatten)]
    pub pvoutput: PvOutputArgs,

    #[clap(flatten)]
    pub report: ReportArgs,

    /// Timeout of every single HTTP call.
    #[clap(long, env = "HTTP_TIMEOUT", default_value = "10s")]
    pub http_timeout: humantime::Duration,

    /// Skip the run while another one still holds this file locked.
    #[clap(long, env = "LOCK_FILE", default_value_os_t = default_lock_file())]
    pub lock_file: PathBuf,

    /// Print the report instead of uploading it.
    #[clap(long)]
    pub dry_run: bool,

    #[clap(flatten)]
    pub logging: LoggingArgs,
}

fn default_lock_file() -> PathBuf {
    env::temp_dir().join("pvrelay.lock")
}

#[derive(Parser)]
pub struct FroniusArgs {
    /// Inverter (or datamanager) address: `host` or `host:port`.
    #[clap(long = "inverter-host", env = "INVERTER_HOST")]
    pub host: String,

    #[clap(long, env = "METER_DEVICE_ID", default_value = "0")]
    pub meter_device_id: u32,
}

impl FroniusArgs {
    pub fn new_client(&self, timeout: Duration) -> fronius::Api {
        fronius::Api::new(&self.host, timeout, self.meter_device_id)
    }
}

#[derive(Parser)]
pub struct PvOutputArgs {
    #[clap(long = "pvoutput-api-key", env = "PVOUTPUT_API_KEY", required_unless_present = "dry_run")]
    pub api_key: Option<String>,

    #[clap(
        long = "pvoutput-system-id",
        env = "PVOUTPUT_SYSTEM_ID",
        required_unless_present = "dry_run"
    )]
    pub system_id: Option<String>,

    #[clap(long = "pvoutput-url", env = "PVOUTPUT_URL", default_value = pvoutput::DEFAULT_URL)]
    pub url: String,
}

impl PvOutputArgs {
    pub fn new_client(self, timeout: Duration) -> Result<pvoutput::Api> {
        Ok(pvoutput::Api::new(
            self.url,
            self.api_key.context("the PVOutput API key is required")?,
            self.system_id.context("the PVOutput system ID is required")?,
            timeout,
        ))
    }
}

#[derive(Parser)]
pub struct ReportArgs {
    /// Optional field groups to include in the report.
    #[clap(
        long = "fields",
        env = "REPORT_FIELDS",
        value_delimiter = ',',
        num_args = 0..,
        default_value = "daily-energy",
    )]
    pub fields: Vec<ReportField>,

    /// The meter reports positive power when exporting.
    #[clap(long, env = "INVERT_GRID_POWER", value_parser = BoolishValueParser::new())]
    pub invert_grid_power: bool,

    #[clap(long, env = "AGGREGATION", value_enum, default_value_t)]
    pub aggregation: Aggregation,

    #[clap(long, env = "LOAD_ESTIMATION", value_enum, default_value_t)]
    pub load_estimation: LoadEstimation,

    /// What to report as consumption energy when the balance cannot be computed.
    #[clap(long, env = "ENERGY_FALLBACK", value_enum, default_value_t)]
    pub energy_fallback: EnergyFallback,
}

impl ReportArgs {
    #[must_use]
    pub fn fields(&self) -> EnumSet<ReportField> {
        self.fields.iter().copied().collect()
    }

    pub fn settings(&self) -> Settings {
        Settings::builder()
            .aggregation(self.aggregation)
            .estimation(
                Estimation::builder()
                    .load(self.load_estimation)
                    .fallback(self.energy_fallback)
                    .polarity(self.invert_grid_power.into())
                    .build(),
            )
            .fields(self.fields())
            .build()
    }
}

#[derive(Parser)]
pub struct LoggingArgs {
    /// Append the logs to this file instead of the standard error.
    #[clap(long, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[clap(long, env = "DEBUG", value_parser = BoolishValueParser::new())]
    pub debug: bool,
}

impl LoggingArgs {
    pub fn init(&self) -> Result {
        let level = if self.debug { Level::DEBUG } else { Level::INFO };
        let subscriber = tracing_subscriber::fmt().with_max_level(level).compact();
        match &self.log_file {
            None => subscriber.without_time().with_writer(std::io::stderr).try_init(),
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("failed to open `{}`", path.display()))?;
                subscriber.with_ansi(false).with_writer(Mutex::new(file)).try_init()
            }
        }
        .map_err(|error| anyhow!(error))
    }
}

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use firebase_emulator_smoke::emulator::{
    EmulatorEnvironment, EmulatorHost, EmulatorService, FirebaseEmulatorConfig,
};
use firebase_emulator_smoke::logger::{self, LogLevel};
use firebase_emulator_smoke::smoke::{
    http_client, wait_for_emulators, ConfigOverrides, CredentialKind, Profile, Reporter, Runner,
    SmokeConfig, SmokeResult,
};

#[derive(Parser)]
#[command(name = "firebase-emulator-smoke")]
#[command(version, about = "Smoke tests for the Firebase Local Emulator Suite")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    settings: SmokeArgs,

    /// Log level for diagnostics on stderr (debug|verbose|info|warn|error|silent)
    #[arg(long, global = true, env = "SMOKE_LOG", default_value = "warn")]
    log_level: LogLevel,

    /// Shortcut for --log-level debug
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a smoke profile (the default when no subcommand is given)
    Run {
        #[arg(value_name = "PROFILE", default_value = "default-ports")]
        profile: Profile,
    },

    /// List the available profiles
    List,

    /// Only wait until the profile's emulators answer
    Wait {
        #[arg(value_name = "PROFILE", default_value = "default-ports")]
        profile: Profile,
    },
}

#[derive(Args, Debug, Default, Clone)]
struct SmokeArgs {
    /// Project id (overrides GCLOUD_PROJECT)
    #[arg(long, global = true, value_name = "ID")]
    project: Option<String>,

    /// Auth emulator as host:port
    #[arg(long, global = true, value_name = "HOST")]
    auth_host: Option<String>,

    /// Firestore emulator as host:port
    #[arg(long, global = true, value_name = "HOST")]
    firestore_host: Option<String>,

    /// Storage emulator as host:port
    #[arg(long, global = true, value_name = "HOST")]
    storage_host: Option<String>,

    /// Functions emulator as host:port
    #[arg(long, global = true, value_name = "HOST")]
    functions_host: Option<String>,

    /// Storage bucket (defaults to <project>.appspot.com)
    #[arg(long, global = true)]
    bucket: Option<String>,

    /// Functions region
    #[arg(long, global = true)]
    region: Option<String>,

    /// Web API key used for the custom-token exchange
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Credential kind (service-account|mock)
    #[arg(long, global = true, value_name = "KIND")]
    credential: Option<CredentialKind>,

    /// firebase.json-style file to read emulator ports from
    #[arg(long, global = true, value_name = "PATH")]
    firebase_config: Option<PathBuf>,

    /// Ignore emulator environment variables
    #[arg(long, global = true)]
    ignore_env: bool,

    /// Wait for every emulator before running the checks
    #[arg(long, global = true)]
    wait: bool,

    /// Readiness attempts per emulator
    #[arg(long, global = true, value_name = "N")]
    wait_attempts: Option<u32>,

    /// Delay between readiness attempts in seconds
    #[arg(long, global = true, value_name = "SECS")]
    wait_delay_secs: Option<u64>,
}

impl SmokeArgs {
    fn overrides(&self) -> SmokeResult<ConfigOverrides> {
        let mut overrides = ConfigOverrides {
            project_id: self.project.clone(),
            storage_bucket: self.bucket.clone(),
            region: self.region.clone(),
            api_key: self.api_key.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
            credential: self.credential,
            readiness_attempts: self.wait_attempts,
            readiness_delay: self.wait_delay_secs.map(Duration::from_secs),
            wait: self.wait.then_some(true),
            ..Default::default()
        };

        let hosts = [
            (EmulatorService::Auth, &self.auth_host),
            (EmulatorService::Firestore, &self.firestore_host),
            (EmulatorService::Storage, &self.storage_host),
            (EmulatorService::Functions, &self.functions_host),
        ];
        for (service, raw) in hosts {
            if let Some(raw) = raw {
                overrides.hosts.insert(service, EmulatorHost::parse(raw)?);
            }
        }
        Ok(overrides)
    }

    fn resolve(&self, profile: Profile) -> SmokeResult<SmokeConfig> {
        let firebase_json = self
            .firebase_config
            .as_ref()
            .map(FirebaseEmulatorConfig::from_file)
            .transpose()?;
        let environment = if self.ignore_env {
            None
        } else {
            Some(EmulatorEnvironment::from_env()?)
        };
        SmokeConfig::resolve(
            profile.defaults(),
            firebase_json.as_ref(),
            environment.as_ref(),
            &self.overrides()?,
        )
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        cli.log_level
    };
    logger::init(level);

    let code = match cli.command {
        Some(Commands::List) => {
            list_profiles();
            0
        }
        Some(Commands::Wait { profile }) => wait(profile, &cli.settings).await,
        Some(Commands::Run { profile }) => run(profile, &cli.settings).await,
        None => run(Profile::DefaultPorts, &cli.settings).await,
    };
    ExitCode::from(code)
}

fn list_profiles() {
    for profile in Profile::ALL {
        println!("{:<24}{}", profile.name(), profile.description());
    }
}

async fn run(profile: Profile, settings: &SmokeArgs) -> u8 {
    let config = match settings.resolve(profile) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("[FAIL] Configuration failed: {err}");
            return 1;
        }
    };
    log::debug!("running profile {profile} with {config:?}");

    let mut runner = Runner::new(profile, config, io::stdout());
    let report = runner.run().await;
    if report.exit_code() == 0 {
        0
    } else {
        1
    }
}

async fn wait_for_profile(profile: Profile, settings: &SmokeArgs) -> SmokeResult<()> {
    let config = settings.resolve(profile)?;
    let http = http_client(config.timeout)?;
    let services = profile.services(&config);
    let mut reporter = Reporter::new(io::stdout());
    let ready = wait_for_emulators(&config, &services, &http, &mut reporter).await;
    reporter.flush();
    ready
}

async fn wait(profile: Profile, settings: &SmokeArgs) -> u8 {
    match wait_for_profile(profile, settings).await {
        Ok(()) => {
            println!("All emulators for {profile} are ready");
            0
        }
        Err(err) => {
            eprintln!("[FAIL] {err}");
            1
        }
    }
}

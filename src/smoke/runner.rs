use std::io::Write;
use std::time::Duration;

use reqwest::Client;

use crate::app::{delete_app, initialize_app, AppOptions, AppSettings, EmulatorApp};
use crate::emulator::{wait_until_ready, EmulatorErrorCode, EmulatorService};
use crate::smoke::checks::CheckContext;
use crate::smoke::config::SmokeConfig;
use crate::smoke::error::{config_error, exhausted, SmokeError, SmokeResult};
use crate::smoke::profiles::{Heading, PlannedCheck, Profile, ReportStyle};
use crate::smoke::report::{CheckResult, Reporter, SuiteReport};

/// Builds the shared HTTP client; every request inherits the timeout.
pub fn http_client(timeout: Duration) -> SmokeResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| config_error(format!("Failed to build HTTP client: {err}")))
}

/// Polls each emulator root until it answers, reporting one line per service.
pub async fn wait_for_emulators<W: Write>(
    config: &SmokeConfig,
    services: &[EmulatorService],
    http: &Client,
    reporter: &mut Reporter<W>,
) -> SmokeResult<()> {
    for service in services {
        let host = config.require_host(*service)?;
        let url = format!("{}/", host.base_url());
        log::debug!("waiting for the {service} emulator at {url}");
        let attempts = wait_until_ready(http, &url, config.readiness)
            .await
            .map_err(|err| match err.code {
                EmulatorErrorCode::NotReady => exhausted(err.message()),
                _ => SmokeError::from(err),
            })?;
        reporter.ok(format!(
            "{service} emulator ready at {} (attempt {attempts})",
            host.authority()
        ));
    }
    Ok(())
}

/// Runs one profile against the configured emulators.
pub struct Runner<W: Write> {
    profile: Profile,
    config: SmokeConfig,
    reporter: Reporter<W>,
}

impl<W: Write> Runner<W> {
    pub fn new(profile: Profile, config: SmokeConfig, out: W) -> Self {
        let reporter = Reporter::new(out)
            .with_width(profile.banner_width())
            .with_marks(profile.marks());
        Self {
            profile,
            config,
            reporter,
        }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn config(&self) -> &SmokeConfig {
        &self.config
    }

    pub fn into_output(self) -> W {
        self.reporter.into_inner()
    }

    /// Runs every planned check in order. A failing check never stops the
    /// ones after it; only setup failures end the run early.
    pub async fn run(&mut self) -> SuiteReport {
        let mut report = SuiteReport::new(self.profile.name());

        if self.profile.style() == ReportStyle::Summary {
            self.reporter.banner(self.profile.title());
        }
        for line in self.profile.intro_lines() {
            self.reporter.line(line);
        }

        let http = match http_client(self.config.timeout) {
            Ok(http) => http,
            Err(err) => return self.abort(report, "Configuration", err),
        };

        if self.config.wait {
            let services = self.profile.services(&self.config);
            if let Err(err) =
                wait_for_emulators(&self.config, &services, &http, &mut self.reporter).await
            {
                return self.abort(report, "Emulator readiness", err);
            }
        }

        let app = match self.initialize().await {
            Ok(app) => app,
            Err(err) => return self.abort(report, "Initialization", err),
        };
        for line in self.profile.init_lines(&self.config, self.reporter.marks()) {
            self.reporter.line(line);
        }

        for planned in self.profile.plan(&self.config) {
            let result = self.run_check(&planned, &app, &http).await;
            report.push(result);
        }

        if let Err(err) = delete_app(&app) {
            log::warn!("failed to release app '{}': {err}", app.name());
        }
        self.finish(&report);
        report
    }

    async fn initialize(&self) -> SmokeResult<EmulatorApp> {
        let config = &self.config;
        let credential = config.credential.build(&config.project_id)?;
        credential
            .access_token()
            .await
            .map_err(|err| config_error(format!("Credential is not usable: {err}")))?;

        let options = AppOptions {
            project_id: config.project_id.clone(),
            storage_bucket: Some(config.bucket()),
            api_key: Some(config.api_key.clone()),
        };
        let settings = AppSettings {
            name: config.app_name.clone(),
        };
        Ok(initialize_app(options, credential, Some(settings))?)
    }

    async fn run_check(
        &mut self,
        planned: &PlannedCheck,
        app: &EmulatorApp,
        http: &Client,
    ) -> CheckResult {
        match &planned.heading {
            Heading::Section(area) => self.reporter.section(area),
            Heading::Plain(text) => self.reporter.heading(text),
            Heading::None => {}
        }

        let outcome = {
            let mut ctx = CheckContext {
                config: &self.config,
                app,
                http,
                reporter: &mut self.reporter,
            };
            planned.check.run(&mut ctx).await
        };

        match outcome {
            Ok(true) => CheckResult::passed(&planned.label),
            Ok(false) => CheckResult::failed(&planned.label, None),
            Err(err) => {
                log::debug!("{} failed: {err:?}", planned.label);
                match self.profile.style() {
                    ReportStyle::Summary => self
                        .reporter
                        .fail(format!("{} test failed: {err}", planned.feature)),
                    ReportStyle::Plain => self.reporter.fail(err.to_string()),
                }
                CheckResult::failed(&planned.label, Some(err.to_string()))
            }
        }
    }

    fn abort(&mut self, mut report: SuiteReport, stage: &str, err: SmokeError) -> SuiteReport {
        self.reporter.fail(format!("{stage} failed: {err}"));
        report.push(CheckResult::failed(stage, Some(err.to_string())));
        self.finish(&report);
        report
    }

    fn finish(&mut self, report: &SuiteReport) {
        if self.profile.style() == ReportStyle::Summary {
            self.reporter.summary(report);
        }
        let message = if report.all_passed() {
            self.profile.success_message()
        } else {
            self.profile.failure_message()
        };
        self.reporter.line(message);
        self.reporter.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::{EmulatorHost, ReadinessPolicy};
    use crate::smoke::config::CredentialKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unique_name(prefix: &str) -> String {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        format!("{prefix}-{}", COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    fn unreachable_config(profile: Profile) -> SmokeConfig {
        let mut config = profile.defaults();
        for service in EmulatorService::ALL {
            config = config.with_host(service, EmulatorHost::local(9));
        }
        config.timeout = Duration::from_secs(2);
        config.readiness = ReadinessPolicy::new(1, Duration::from_millis(1));
        config.app_name = Some(unique_name("runner"));
        config
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unreachable_emulators_fail_every_check_but_run_them_all() {
        let config = unreachable_config(Profile::DefaultPorts);
        let mut runner = Runner::new(Profile::DefaultPorts, config, Vec::new());
        let report = runner.run().await;
        let output = String::from_utf8(runner.into_output()).unwrap();

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.exit_code(), 1);
        assert!(output.starts_with(&"=".repeat(50)));
        assert!(output.contains("[FAIL] Authentication test failed: "));
        assert!(output.contains("[FAIL] Firestore test failed: "));
        assert!(output.contains("[FAIL] Storage test failed: "));
        assert!(output.contains("Storage: [FAIL] FAILED"));
        assert!(output.trim_end().ends_with("Some tests failed!"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn readiness_failure_aborts_before_checks() {
        let mut config = unreachable_config(Profile::AuthOnly);
        config.wait = true;
        let mut runner = Runner::new(Profile::AuthOnly, config, Vec::new());
        let report = runner.run().await;
        let output = String::from_utf8(runner.into_output()).unwrap();

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].label, "Emulator readiness");
        assert!(output.contains("[FAIL] Emulator readiness failed: "));
        assert!(output.contains("smoke/retries-exhausted"));
        assert!(output.contains("[FAIL] Auth-only test FAILED"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn duplicate_app_name_is_an_initialization_failure() {
        let mut config = unreachable_config(Profile::Quick);
        config.credential = CredentialKind::Mock;
        let name = config.app_name.clone().unwrap();
        let existing = initialize_app(
            AppOptions {
                project_id: "demo-sta2ble-ports".into(),
                ..Default::default()
            },
            config.credential.build("demo-sta2ble-ports").unwrap(),
            Some(AppSettings {
                name: Some(name.clone()),
            }),
        )
        .unwrap();

        let mut runner = Runner::new(Profile::Quick, config, Vec::new());
        let report = runner.run().await;
        let output = String::from_utf8(runner.into_output()).unwrap();
        delete_app(&existing).unwrap();

        assert_eq!(report.exit_code(), 1);
        assert!(output.starts_with("Initializing Firebase...\n"));
        assert!(output.contains("[FAIL] Initialization failed: "));
        assert!(output.contains("app/duplicate-app"));
    }
}

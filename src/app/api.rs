use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, MutexGuard};

use crate::app::errors::{AppError, AppResult};
use crate::app::types::{AppOptions, AppSettings, EmulatorApp};
use crate::credential::CredentialArc;

pub const DEFAULT_ENTRY_NAME: &str = "[DEFAULT]";

static APPS: LazyLock<Mutex<HashMap<String, EmulatorApp>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn apps_lock() -> MutexGuard<'static, HashMap<String, EmulatorApp>> {
    APPS.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn normalize_name(settings: &AppSettings) -> AppResult<String> {
    let name = settings
        .name
        .clone()
        .unwrap_or_else(|| DEFAULT_ENTRY_NAME.to_string());
    if name.trim().is_empty() {
        return Err(AppError::BadAppName { app_name: name });
    }
    Ok(name)
}

/// Registers the process-wide handle used by every service client.
///
/// Initializing the same name twice is an error, mirroring the Admin SDK
/// behaviour of refusing to overwrite an existing default app.
pub fn initialize_app(
    options: AppOptions,
    credential: CredentialArc,
    settings: Option<AppSettings>,
) -> AppResult<EmulatorApp> {
    let name = normalize_name(&settings.unwrap_or_default())?;
    if options.project_id.trim().is_empty() {
        return Err(AppError::NoProjectId);
    }

    let mut apps = apps_lock();
    if apps.contains_key(&name) {
        return Err(AppError::DuplicateApp { app_name: name });
    }

    let app = EmulatorApp::new(name.clone(), options, credential);
    apps.insert(name, app.clone());
    log::debug!(
        "initialized app '{}' for project {}",
        app.name(),
        app.project_id()
    );
    Ok(app)
}

pub fn get_app(name: Option<&str>) -> AppResult<EmulatorApp> {
    let lookup = name.unwrap_or(DEFAULT_ENTRY_NAME);
    apps_lock()
        .get(lookup)
        .cloned()
        .ok_or_else(|| AppError::NoApp {
            app_name: lookup.to_string(),
        })
}

pub fn get_apps() -> Vec<EmulatorApp> {
    apps_lock().values().cloned().collect()
}

pub fn delete_app(app: &EmulatorApp) -> AppResult<()> {
    let mut apps = apps_lock();
    match apps.get(app.name()) {
        Some(existing) if existing.ptr_eq(app) => {
            apps.remove(app.name());
            Ok(())
        }
        _ => Err(AppError::NoApp {
            app_name: app.name().to_string(),
        }),
    }
}

use std::fmt;
use std::sync::Arc;

use crate::credential::CredentialArc;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppOptions {
    pub project_id: String,
    pub storage_bucket: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppSettings {
    pub name: Option<String>,
}

/// Process-wide client handle that every service client is built from.
#[derive(Clone)]
pub struct EmulatorApp {
    inner: Arc<EmulatorAppInner>,
}

struct EmulatorAppInner {
    name: String,
    options: AppOptions,
    credential: CredentialArc,
}

impl EmulatorApp {
    pub(crate) fn new(name: String, options: AppOptions, credential: CredentialArc) -> Self {
        Self {
            inner: Arc::new(EmulatorAppInner {
                name,
                options,
                credential,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn options(&self) -> &AppOptions {
        &self.inner.options
    }

    pub fn project_id(&self) -> &str {
        &self.inner.options.project_id
    }

    pub fn credential(&self) -> &CredentialArc {
        &self.inner.credential
    }

    pub fn ptr_eq(&self, other: &EmulatorApp) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for EmulatorApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmulatorApp")
            .field("name", &self.inner.name)
            .field("options", &self.inner.options)
            .finish()
    }
}

use std::fmt;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    NoApp { app_name: String },
    BadAppName { app_name: String },
    DuplicateApp { app_name: String },
    NoProjectId,
}

impl AppError {
    pub fn code_str(&self) -> &'static str {
        match self {
            AppError::NoApp { .. } => "app/no-app",
            AppError::BadAppName { .. } => "app/bad-app-name",
            AppError::DuplicateApp { .. } => "app/duplicate-app",
            AppError::NoProjectId => "app/no-project-id",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NoApp { app_name } => {
                write!(f, "No app '{app_name}' has been created - call initialize_app() first")
            }
            AppError::BadAppName { app_name } => write!(f, "Illegal app name: '{app_name}'"),
            AppError::DuplicateApp { app_name } => {
                write!(f, "An app named '{app_name}' already exists")
            }
            AppError::NoProjectId => write!(
                f,
                "A project id is required; set GCLOUD_PROJECT or pass --project"
            ),
        }
    }
}

impl std::error::Error for AppError {}

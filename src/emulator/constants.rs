pub const AUTH_EMULATOR_HOST_VAR: &str = "FIREBASE_AUTH_EMULATOR_HOST";
pub const FIRESTORE_EMULATOR_HOST_VAR: &str = "FIRESTORE_EMULATOR_HOST";
pub const STORAGE_EMULATOR_HOST_VAR: &str = "FIREBASE_STORAGE_EMULATOR_HOST";
pub const FUNCTIONS_EMULATOR_HOST_VAR: &str = "FUNCTIONS_EMULATOR_HOST";
pub const PROJECT_ID_VAR: &str = "GCLOUD_PROJECT";
pub const PROJECT_ID_FALLBACK_VAR: &str = "GOOGLE_CLOUD_PROJECT";

pub const DEFAULT_EMULATOR_HOST: &str = "127.0.0.1";

pub const DEFAULT_AUTH_PORT: u16 = 9099;
pub const DEFAULT_FIRESTORE_PORT: u16 = 8080;
pub const DEFAULT_STORAGE_PORT: u16 = 9199;
pub const DEFAULT_FUNCTIONS_PORT: u16 = 5001;

pub const DEFAULT_READINESS_ATTEMPTS: u32 = 10;
pub const DEFAULT_READINESS_DELAY_SECS: u64 = 3;

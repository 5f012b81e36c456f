use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "LumiCare";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Master one-time code that always authenticates and is never consumed.
/// Kept for demo resilience across restarts, exactly like the original
/// deployment.
pub const MASTER_OTP: &str = "1234";

/// Issued bearer tokens expire after this many days.
pub const TOKEN_EXPIRE_DAYS: i64 = 7;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_TOKEN_SECRET: &str = "super_secret_key_for_hackathon_12345";

pub fn default_log_filter() -> String {
    "info,lumicare=debug".to_string()
}

/// Get the application data directory (~/LumiCare/)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Database path: `LUMICARE_DB` env override, else ~/LumiCare/lumi.db
pub fn database_path() -> PathBuf {
    std::env::var("LUMICARE_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| app_data_dir().join("lumi.db"))
}

/// Listen address: `LUMICARE_ADDR` env override, else 0.0.0.0:8000
pub fn bind_addr() -> String {
    std::env::var("LUMICARE_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
}

/// HS256 signing secret: `LUMICARE_TOKEN_SECRET` env override, else the
/// well-known development secret.
pub fn token_secret() -> Vec<u8> {
    std::env::var("LUMICARE_TOKEN_SECRET")
        .unwrap_or_else(|_| DEFAULT_TOKEN_SECRET.to_string())
        .into_bytes()
}

//! Version banner printed by `socket2tcp --version`.

use socket2tcp_core::{PROJECT_NAME, VERSION};

const BANNER: &str = r#"                _        _   _____  _
               | |      | | / __  \| |
 ___  ___   ___| | _____| |_`' / /'| |_ ___ _ __
/ __|/ _ \ / __| |/ / _ \ __| / /  | __/ __| '_ \
\__ \ (_) | (__|   <  __/ |_./ /___| || (__| |_) |
|___/\___/ \___|_|\_\___|\__\_____/ \__\___| .__/
                                           | |
                                           |_|
"#;

/// Build date injected at compile time via `SOCKET2TCP_BUILD_DATE`.
pub const BUILD_DATE: &str = match option_env!("SOCKET2TCP_BUILD_DATE") {
    Some(v) => v,
    None => "unknown",
};

/// Commit id injected at compile time via `SOCKET2TCP_COMMIT_ID`.
pub const COMMIT_ID: &str = match option_env!("SOCKET2TCP_COMMIT_ID") {
    Some(v) => v,
    None => "unknown",
};

/// Banner plus build metadata.
pub fn version_info() -> String {
    format!(
        "{BANNER}\nName: {PROJECT_NAME}\nVersion: {VERSION}\nArch: {}/{}\nBuildDate: {BUILD_DATE}\nCommitID: {COMMIT_ID}\n",
        std::env::consts::OS,
        std::env::consts::ARCH,
    )
}

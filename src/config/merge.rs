use super::Config;

pub const USERNAME_ENV: &str = "GIT_AUTH_USERNAME";
pub const PASSWORD_ENV: &str = "GIT_AUTH_PASSWORD";
pub const REMOTE_URL_ENV: &str = "GITCHAT_REMOTE_URL";
pub const BRANCH_ENV: &str = "GITCHAT_BRANCH";
pub const LISTEN_ADDR_ENV: &str = "GITCHAT_LISTEN_ADDR";
pub const ROTATE_BYTES_ENV: &str = "GITCHAT_BLOCK_ROTATE_BYTES";

pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides from any variable source; blank values are ignored.
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|raw| raw.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    if let Some(username) = get(USERNAME_ENV) {
        config.remote.username = Some(username);
    }
    // Passwords may legitimately carry surrounding whitespace.
    if let Some(password) = lookup(PASSWORD_ENV).filter(|raw| !raw.is_empty()) {
        config.remote.password = Some(password);
    }
    if let Some(url) = get(REMOTE_URL_ENV) {
        config.remote.url = url;
    }
    if let Some(branch) = get(BRANCH_ENV) {
        config.remote.branch = Some(branch);
    }
    if let Some(addr) = get(LISTEN_ADDR_ENV) {
        config.server.listen_addr = addr;
    }
    if let Some(raw) = get(ROTATE_BYTES_ENV) {
        match raw.parse::<u64>() {
            Ok(value) => config.comments.block_rotate_bytes = value,
            Err(err) => {
                tracing::warn!("invalid {ROTATE_BYTES_ENV}, ignoring: {err}");
            }
        }
    }
}

use std::net::SocketAddr;
use std::time::Duration;

const HTTP_ADDR: &str = "HOSTWATCH_HTTP_ADDR";

/// Bind address for the HTTP endpoint, overridable through the environment
pub fn get_http_addr(default: SocketAddr) -> SocketAddr {
    let addr_from_env = std::env::var(HTTP_ADDR);
    addr_from_env.map_or(default, |res| res.parse().unwrap_or(default))
}

const HTTP_TOKEN: &str = "HOSTWATCH_HTTP_TOKEN";

pub fn get_http_token() -> Option<String> {
    let token_from_env = std::env::var(HTTP_TOKEN);
    token_from_env.ok().filter(|token| !token.is_empty())
}

/// Render a duration truncated to whole seconds, e.g. `1h2m3s`, `4m0s`, `12s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, secs / 60 % 60, secs % 60);

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

use std::env;

// Runtime/server constants (not game rules).

pub fn http_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

/// Production deployments lock CORS to the published client origin.
pub fn is_production() -> bool {
    matches!(env::var("APP_ENV").as_deref(), Ok("production"))
}

/// Browser origins the CORS layer accepts. Local development always talks to
/// the dev client; production adds the deployed client, overridable through
/// `CLIENT_ORIGIN`.
pub fn allowed_origins() -> Vec<String> {
    const DEV_CLIENT: &str = "http://localhost:3000";

    if is_production() {
        let deployed = env::var("CLIENT_ORIGIN")
            .unwrap_or_else(|_| "https://number-duel-client.onrender.com".to_string());
        vec![deployed, DEV_CLIENT.to_string()]
    } else {
        vec![DEV_CLIENT.to_string()]
    }
}

pub const SESSION_CHANNEL_CAPACITY: usize = 1024;
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

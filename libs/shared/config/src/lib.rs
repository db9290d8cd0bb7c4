use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Policy for ad-hoc bookings made without a time slot: when true they
    /// are created approved and marked paid, matching the legacy flow.
    pub auto_approve_direct_bookings: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            auto_approve_direct_bookings: env::var("AUTO_APPROVE_DIRECT_BOOKINGS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        };

        if !config.is_configured() {
            warn!("Supabase not configured - scheduling falls back to in-memory storage");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

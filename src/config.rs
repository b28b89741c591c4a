use serde::Deserialize;
use std::path::PathBuf;

/// Configuration for the activation and reset flows.
///
/// Field names on the user record (`id_property`, `email_property`) are
/// configuration rather than code: the store's schema is owned by the
/// caller, and every lookup and patch goes through these names.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivatorConfig {
    /// Directory holding `<language>/<kind>.tpl.html` email templates.
    pub templates: PathBuf,
    /// Validity window for reset-class codes, in minutes.
    pub reset_expire_minutes: i64,
    /// Protocol prefix used when building links, e.g. `https://`.
    pub protocol: String,
    /// Domain used when building links.
    pub domain: String,
    /// Name of the identity field on the user record.
    pub id_property: String,
    /// Name of the email field on the user record.
    pub email_property: String,
    /// From address stamped on outgoing mail.
    pub from_address: String,
    /// Template language, falls back to `default` when missing.
    pub language: String,
    /// Cache loaded templates in memory.
    pub cache_templates: bool,
    pub path_activate: String,
    pub path_password_reset: String,
    pub path_cafe_auth: String,
    pub path_cafe_reset: String,
    pub subject_activate: String,
    pub subject_password_reset: String,
    pub subject_cafe_auth: String,
    pub subject_cafe_reset: String,
}

impl Default for ActivatorConfig {
    fn default() -> Self {
        Self {
            templates: PathBuf::from("./templates"),
            reset_expire_minutes: 60,
            protocol: "https://".into(),
            domain: "localhost".into(),
            id_property: "id".into(),
            email_property: "email".into(),
            from_address: "no-reply@localhost".into(),
            language: "en_US".into(),
            cache_templates: false,
            path_activate: "/api/1/users/activate".into(),
            path_password_reset: "/api/1/users/forgot".into(),
            path_cafe_auth: "/api/1/cafe/auth".into(),
            path_cafe_reset: "/api/1/cafe/forgot".into(),
            subject_activate: "Activate Your Account".into(),
            subject_password_reset: "Reset Password".into(),
            subject_cafe_auth: "Your Login Code".into(),
            subject_cafe_reset: "Reset Password".into(),
        }
    }
}

impl ActivatorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            templates: std::env::var("ACTIVATOR_TEMPLATES")
                .map(PathBuf::from)
                .unwrap_or(defaults.templates),
            reset_expire_minutes: std::env::var("ACTIVATOR_RESET_EXPIRE_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(defaults.reset_expire_minutes),
            protocol: std::env::var("ACTIVATOR_PROTOCOL").unwrap_or(defaults.protocol),
            domain: std::env::var("ACTIVATOR_DOMAIN").unwrap_or(defaults.domain),
            id_property: std::env::var("ACTIVATOR_ID_PROPERTY").unwrap_or(defaults.id_property),
            email_property: std::env::var("ACTIVATOR_EMAIL_PROPERTY")
                .unwrap_or(defaults.email_property),
            from_address: std::env::var("ACTIVATOR_FROM").unwrap_or(defaults.from_address),
            language: std::env::var("ACTIVATOR_LANGUAGE").unwrap_or(defaults.language),
            cache_templates: std::env::var("ACTIVATOR_CACHE_TEMPLATES")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.cache_templates),
            path_activate: std::env::var("ACTIVATOR_PATH_ACTIVATE")
                .unwrap_or(defaults.path_activate),
            path_password_reset: std::env::var("ACTIVATOR_PATH_RESET")
                .unwrap_or(defaults.path_password_reset),
            path_cafe_auth: std::env::var("ACTIVATOR_PATH_CAFE_AUTH")
                .unwrap_or(defaults.path_cafe_auth),
            path_cafe_reset: std::env::var("ACTIVATOR_PATH_CAFE_RESET")
                .unwrap_or(defaults.path_cafe_reset),
            subject_activate: defaults.subject_activate,
            subject_password_reset: defaults.subject_password_reset,
            subject_cafe_auth: defaults.subject_cafe_auth,
            subject_cafe_reset: defaults.subject_cafe_reset,
        }
    }

    /// Link base, `protocol + domain`.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.protocol, self.domain)
    }
}

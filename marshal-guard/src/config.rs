//! Deployment configuration.
//!
//! All settings come from the environment with hard-coded fallbacks, so a
//! bare deployment starts with no config file at all. Which trust-anchor
//! variable is set selects the validation variant: `ORG_CERT_FILE` wins over
//! `CA_CERT_FILE`, which wins over the `PUBLIC_KEY_FILE` default.

use crate::error::{GuardError, GuardResult};
use marshal_license::{resolve_path, TrustAnchor, Validator};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable names, shared with the deployment's `.env`.
pub const ENV_LICENSE_FILE: &str = "LICENSE_FILE";
pub const ENV_PUBLIC_KEY_FILE: &str = "PUBLIC_KEY_FILE";
pub const ENV_CA_CERT_FILE: &str = "CA_CERT_FILE";
pub const ENV_ORG_CERT_FILE: &str = "ORG_CERT_FILE";
pub const ENV_DEPLOYMENT_PATH: &str = "DEPLOYMENT_PATH";
pub const ENV_WEB_HOST: &str = "WEB_HOST";
pub const ENV_WEB_PORT: &str = "WEB_PORT";
pub const ENV_DEBUG: &str = "MARSHAL_DEBUG";
pub const ENV_LOG_DIR: &str = "LOG_DIR";

const DEFAULT_LICENSE_FILE: &str = "./license.lic";
const DEFAULT_PUBLIC_KEY_FILE: &str = "./certificates/marshal_public.pem";
const DEFAULT_DEPLOYMENT_PATH: &str = "/home/kaptifi-vision";
const DEFAULT_WEB_HOST: &str = "0.0.0.0";
const DEFAULT_WEB_PORT: u16 = 8000;

/// Resolved guard configuration.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// License artifact path.
    pub license_file: PathBuf,
    /// Issuer public key path (direct-key variant).
    pub public_key_file: PathBuf,
    /// CA certificate path; set selects the certificate-embedded variant.
    pub ca_cert_file: Option<PathBuf>,
    /// Organization certificate path; set selects the separate-cert variant.
    pub org_cert_file: Option<PathBuf>,
    /// Deployment root the reaper operates on.
    pub deployment_path: PathBuf,
    /// Bind host for the web layer (consumed by the HTTP shim, not here).
    pub web_host: String,
    /// Bind port for the web layer.
    pub web_port: u16,
    /// Raises log verbosity to DEBUG.
    pub debug: bool,
    /// Optional log directory for file output.
    pub log_dir: Option<PathBuf>,
    /// Interval between license checks.
    pub check_interval: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            license_file: PathBuf::from(DEFAULT_LICENSE_FILE),
            public_key_file: PathBuf::from(DEFAULT_PUBLIC_KEY_FILE),
            ca_cert_file: None,
            org_cert_file: None,
            deployment_path: PathBuf::from(DEFAULT_DEPLOYMENT_PATH),
            web_host: DEFAULT_WEB_HOST.to_string(),
            web_port: DEFAULT_WEB_PORT,
            debug: false,
            log_dir: None,
            check_interval: Duration::from_secs(3600),
        }
    }
}

impl GuardConfig {
    /// Builds the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Config`] for values that fail to parse; unset
    /// variables fall back to defaults.
    pub fn from_env() -> GuardResult<Self> {
        let web_port = match env::var(ENV_WEB_PORT) {
            Ok(raw) => raw.trim().parse::<u16>().map_err(|_| {
                GuardError::Config(format!("{ENV_WEB_PORT} is not a port number: {raw:?}"))
            })?,
            Err(_) => DEFAULT_WEB_PORT,
        };

        Ok(Self {
            license_file: resolve_path(None, ENV_LICENSE_FILE, DEFAULT_LICENSE_FILE),
            public_key_file: resolve_path(None, ENV_PUBLIC_KEY_FILE, DEFAULT_PUBLIC_KEY_FILE),
            ca_cert_file: optional_path(ENV_CA_CERT_FILE),
            org_cert_file: optional_path(ENV_ORG_CERT_FILE),
            deployment_path: resolve_path(None, ENV_DEPLOYMENT_PATH, DEFAULT_DEPLOYMENT_PATH),
            web_host: env::var(ENV_WEB_HOST).unwrap_or_else(|_| DEFAULT_WEB_HOST.to_string()),
            web_port,
            debug: env::var(ENV_DEBUG).is_ok_and(|v| {
                matches!(v.trim(), "1" | "true" | "yes" | "on")
            }),
            log_dir: optional_path(ENV_LOG_DIR),
            check_interval: Duration::from_secs(3600),
        })
    }

    /// Loads the trust anchor and constructs the deployment's validator.
    ///
    /// # Errors
    ///
    /// Fails when the selected anchor file is missing or unparsable. Callers
    /// treat this as fatal; the service must not run without a usable anchor.
    pub fn build_validator(&self) -> GuardResult<Validator> {
        let anchor = if let Some(org_cert) = &self.org_cert_file {
            TrustAnchor::org_certificate_from_file(org_cert)?
        } else if let Some(ca_cert) = &self.ca_cert_file {
            TrustAnchor::ca_certificate_from_file(ca_cert)?
        } else {
            TrustAnchor::public_key_from_file(&self.public_key_file)?
        };
        Ok(Validator::new(self.license_file.clone(), anchor))
    }
}

fn optional_path(var: &str) -> Option<PathBuf> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Some(PathBuf::from(value.trim())),
        _ => None,
    }
}

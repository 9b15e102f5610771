//! Connection settings for the hosted backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Which of the two backend credentials a caller needs.
///
/// Read-only work asks for [`Privilege::Restricted`]; inserts, updates and
/// deletes ask for [`Privilege::Elevated`]. There is no default: every call
/// site names the level it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    /// Public key, subject to row-level policies.
    Restricted,
    /// Service key, bypasses row-level policies.
    Elevated,
}

impl Privilege {
    /// Environment variable holding the key for this privilege level.
    pub const fn key_variable(self) -> &'static str {
        match self {
            Self::Restricted => "BACKEND_PUBLIC_KEY",
            Self::Elevated => "BACKEND_SERVICE_KEY",
        }
    }

    /// Variable name used by older tooling, accepted as a fallback.
    pub const fn legacy_key_variable(self) -> &'static str {
        match self {
            Self::Restricted => "VITE_SUPABASE_ANON_KEY",
            Self::Elevated => "SUPABASE_SERVICE_ROLE_KEY",
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Restricted => write!(f, "restricted"),
            Self::Elevated => write!(f, "elevated"),
        }
    }
}

impl FromStr for Privilege {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "restricted" | "public" | "anon" => Ok(Self::Restricted),
            "elevated" | "service" => Ok(Self::Elevated),
            other => Err(format!("unknown privilege level: {other}")),
        }
    }
}

/// Endpoint and key resolved for one process invocation.
///
/// Built only by the configuration loader, which guarantees both values are
/// non-empty. The key is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    endpoint: Url,
    key: String,
    privilege: Privilege,
}

impl ConnectionConfig {
    pub(crate) fn new(endpoint: Url, key: String, privilege: Privilege) -> Self {
        Self {
            endpoint,
            key,
            privilege,
        }
    }

    /// Backend base URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Credential sent with every request.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Privilege level the key was selected for.
    pub fn privilege(&self) -> Privilege {
        self.privilege
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("key", &"[REDACTED]")
            .field("privilege", &self.privilege)
            .finish()
    }
}

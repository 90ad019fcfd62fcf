//! Enum types for the DORA metrics domain.
//!
//! Each enum has:
//! - Custom Serialize (as lowercase string)
//! - Custom Deserialize (known variants + catch-all `Other(String)`)
//! - `as_str()`, `is_default()`, `Display` impl

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Macro: defines an enum with known string variants + an Other(String) fallback.
// ---------------------------------------------------------------------------
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident, other_variant = $other_variant:ident,
        variants: [
            $( ($variant:ident, $str:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            $other_variant(String),
        }

        impl $name {
            /// Returns the string representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $str, )+
                    Self::$other_variant(s) => s.as_str(),
                }
            }

            /// Returns `true` if this is the default variant.
            pub fn is_default(&self) -> bool {
                *self == Self::$default
            }

            /// Returns `true` if this is a built-in (non-fallback) variant.
            pub fn is_builtin(&self) -> bool {
                !matches!(self, Self::$other_variant(_))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s.as_str()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $str => Self::$variant, )+
                    other => Self::$other_variant(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $( $str => Self::$variant, )+
                    _ => Self::$other_variant(s),
                }
            }
        }
    };
}

// ===========================================================================
// DeploymentStatus
// ===========================================================================

define_enum! {
    /// Outcome of a deployment workflow run.
    DeploymentStatus, default = Running, other_variant = Other,
    variants: [
        (Success, "success"),
        (Failed, "failed"),
        (Running, "running"),
    ]
}

impl DeploymentStatus {
    /// Maps a CI workflow status onto a deployment status.
    ///
    /// `success` is a success, `failed` and `error` are failures, anything
    /// else (on_hold, canceled, running, ...) is still running.
    pub fn from_ci_status(status: &str) -> Self {
        match status {
            "success" => Self::Success,
            "failed" | "error" => Self::Failed,
            _ => Self::Running,
        }
    }
}

// ===========================================================================
// PrState
// ===========================================================================

define_enum! {
    /// Lifecycle state of a pull request.
    PrState, default = Open, other_variant = Other,
    variants: [
        (Open, "open"),
        (Closed, "closed"),
        (Merged, "merged"),
    ]
}

impl PrState {
    /// Resolves the stored state from the provider state.
    ///
    /// A merge timestamp always wins over whatever state the provider returned.
    pub fn resolve(provider_state: Option<&str>, merged: bool) -> Self {
        if merged {
            return Self::Merged;
        }
        provider_state.map(Self::from).unwrap_or_default()
    }
}

// ===========================================================================
// Environment
// ===========================================================================

define_enum! {
    /// Deployment target environment.
    Environment, default = Production, other_variant = Other,
    variants: [
        (Production, "production"),
        (Staging, "staging"),
        (Development, "development"),
    ]
}

impl Environment {
    /// Infers the environment from a CI workflow name.
    ///
    /// Checked in order: "production"/"prod", "staging", "dev"; anything else
    /// counts as production.
    pub fn infer(workflow_name: &str) -> Self {
        let name = workflow_name.to_lowercase();
        if name.contains("production") || name.contains("prod") {
            Self::Production
        } else if name.contains("staging") {
            Self::Staging
        } else if name.contains("dev") {
            Self::Development
        } else {
            Self::Production
        }
    }
}

// ===========================================================================
// DayFailurePolicy
// ===========================================================================

/// What a range recompute does when one day fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayFailurePolicy {
    /// Stop at the first failed day; later days are not computed.
    #[default]
    Abort,
    /// Record the failure and carry on with the next day.
    Continue,
}

impl DayFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Continue => "continue",
        }
    }
}

impl fmt::Display for DayFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

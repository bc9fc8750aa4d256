use std::env;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::error::{LibError, Result};

pub const PLACEHOLDER_IMAGE_ENV: &str = "FAMILY_GRAPH_PLACEHOLDER_IMAGE";
pub const LOAD_POLICY_ENV: &str = "FAMILY_GRAPH_LOAD_POLICY";

pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "/fallback-icon.png";

/// What to do with a snapshot whose references break the tree invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    #[default]
    Reject,
    Repair,
}

impl LoadPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            LoadPolicy::Reject => "reject",
            LoadPolicy::Repair => "repair",
        }
    }

    pub fn from_str_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reject" => Some(LoadPolicy::Reject),
            "repair" => Some(LoadPolicy::Repair),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeConfig {
    /// Shown for members without an image.
    pub placeholder_image: String,
    pub load_policy: LoadPolicy,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            load_policy: LoadPolicy::default(),
        }
    }
}

impl TreeConfig {
    /// Reads overrides from `FAMILY_GRAPH_PLACEHOLDER_IMAGE` and `FAMILY_GRAPH_LOAD_POLICY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(image) = lookup(PLACEHOLDER_IMAGE_ENV) {
            let image = image.trim();
            if !image.is_empty() {
                config.placeholder_image = image.to_string();
            }
        }

        if let Some(policy) = lookup(LOAD_POLICY_ENV) {
            config.load_policy = LoadPolicy::from_str_value(&policy).ok_or_else(|| {
                LibError::invalid_with_code(
                    "invalid_load_policy",
                    "Load policy must be either 'reject' or 'repair'",
                    anyhow!("invalid {} '{}'", LOAD_POLICY_ENV, policy),
                )
            })?;
        }

        Ok(config)
    }
}

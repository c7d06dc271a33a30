use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::aeronet::{AttributeMap, Vocabulary};

pub const DEFAULT_BASE_URL: &str = "https://aeronet.gsfc.nasa.gov";
pub const DEFAULT_ENDPOINT: &str = "/cgi-bin/print_web_data_v3";

/// Prefix for environment overrides, e.g. `AERONET_SITE_LIST`.
const ENV_PREFIX: &str = "AERONET";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Site list file; the bundled list is used when unset.
    #[serde(default)]
    pub site_list: Option<PathBuf>,
    /// Queryable name -> service parameter name.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    /// Let names missing from `attributes` through unchanged.
    #[serde(default = "default_true")]
    pub passthrough: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint: default_endpoint(),
            site_list: None,
            attributes: HashMap::new(),
            passthrough: true,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load the optional YAML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let settings = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Config: Failed to read configuration")?;
        Ok(settings.try_deserialize()?)
    }

    pub fn attribute_map(&self) -> AttributeMap {
        if self.attributes.is_empty() && self.passthrough {
            return AttributeMap::identity();
        }
        AttributeMap::new(self.attributes.clone(), self.passthrough)
    }

    /// Load the vocabulary once; it is shared read-only afterwards.
    pub fn vocabulary(&self) -> anyhow::Result<Vocabulary> {
        match &self.site_list {
            Some(path) => Vocabulary::load(path)
                .with_context(|| format!("Config: Failed to load site list {:?}", path)),
            None => Vocabulary::builtin().context("Config: Bundled site list is invalid"),
        }
    }
}

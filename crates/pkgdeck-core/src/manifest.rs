use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::identity::PackageIdentity;
use crate::version::is_prerelease;

/// One published version of a package as the index describes it.
///
/// `version` stays a raw string; it is only parsed when compared, so an
/// entry with a malformed version is still listed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageManifest {
    pub id: String,
    pub version: String,
    pub description: Option<String>,
    pub license: Option<String>,
    pub license_url: Option<String>,
    pub homepage: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PackageManifest {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            description: None,
            license: None,
            license_url: None,
            homepage: None,
            authors: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let manifest: Self = toml::from_str(input).context("failed to parse package manifest")?;
        validate_package_id(&manifest.id)?;
        if manifest.version.trim().is_empty() {
            return Err(anyhow!("manifest '{}' has an empty version", manifest.id));
        }
        if manifest.version.trim() != manifest.version {
            return Err(anyhow!(
                "manifest '{}' version '{}' has surrounding whitespace",
                manifest.id,
                manifest.version
            ));
        }
        Ok(manifest)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string(self)
            .with_context(|| format!("failed to serialize manifest for '{}'", self.identity()))
    }

    pub fn identity(&self) -> PackageIdentity {
        PackageIdentity::new(self.id.clone(), self.version.clone())
    }

    pub fn is_prerelease(&self) -> bool {
        is_prerelease(&self.version)
    }
}

fn validate_package_id(id: &str) -> anyhow::Result<()> {
    if id.trim().is_empty() {
        return Err(anyhow!("package id must not be empty"));
    }
    if id
        .chars()
        .any(|ch| !(ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' || ch == '-'))
    {
        return Err(anyhow!("package id contains invalid character(s): {id}"));
    }
    Ok(())
}

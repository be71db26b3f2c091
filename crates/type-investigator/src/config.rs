//! Investigator configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! [investigator]
//! no_parent_policy = "error"   # or "false"
//!
//! [reflect.permissions]
//! global = "ALL"
//!
//! [reflect.permissions.classes]
//! "bank.Vault" = "PUBLIC_ONLY"
//! "plugins.*" = "INVOKE_PUBLIC"
//! ```
//!
//! Every section is optional; an empty document yields the defaults.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{InvestigatorError, InvestigatorResult};
use crate::reflect::PermissionStore;

/// What `is_parent_abstract` does when the subject has no parent below the root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoParentPolicy {
    /// Fail with `InvestigatorError::NoParent`
    #[default]
    Error,
    /// Answer `false`
    False,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InvestigatorConfig {
    /// `[investigator]` section
    pub investigator: InvestigatorSection,
    /// `[reflect]` section
    pub reflect: ReflectSection,
}

/// `[investigator]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InvestigatorSection {
    /// Policy for the parent-abstract query on rootmost types
    pub no_parent_policy: NoParentPolicy,
}

/// `[reflect]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReflectSection {
    /// `[reflect.permissions]` section
    pub permissions: PermissionsSection,
}

/// `[reflect.permissions]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionsSection {
    /// Global default, e.g. `"ALL"` or `"INVOKE_PUBLIC|INSTANTIATE"`
    pub global: String,
    /// Qualified class names or wildcard patterns mapped to permissions
    pub classes: BTreeMap<String, String>,
}

impl Default for PermissionsSection {
    fn default() -> Self {
        Self {
            global: "ALL".to_string(),
            classes: BTreeMap::new(),
        }
    }
}

impl InvestigatorConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> InvestigatorResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| InvestigatorError::Config(e.to_string()))?;
        // Permission strings are validated here
        config.permission_store()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> InvestigatorResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            InvestigatorError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Build the permission store described by `[reflect.permissions]`
    pub fn permission_store(&self) -> InvestigatorResult<PermissionStore> {
        let perms = &self.reflect.permissions;
        PermissionStore::from_table(&perms.global, &perms.classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::ReflectionPermission;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = InvestigatorConfig::from_toml_str("").unwrap();
        assert_eq!(config.investigator.no_parent_policy, NoParentPolicy::Error);

        let store = config.permission_store().unwrap();
        assert_eq!(store.global(), ReflectionPermission::ALL);
        assert!(!store.has_any_restrictions());
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
[investigator]
no_parent_policy = "false"

[reflect.permissions]
global = "INVOKE_PUBLIC|INSTANTIATE"

[reflect.permissions.classes]
"bank.Vault" = "NONE"
"tests.*" = "ALL"
"#;
        let config = InvestigatorConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.investigator.no_parent_policy, NoParentPolicy::False);

        let store = config.permission_store().unwrap();
        assert_eq!(store.global(), ReflectionPermission::PUBLIC_ONLY);
        assert_eq!(store.resolve("bank.Vault"), ReflectionPermission::NONE);
        assert_eq!(store.resolve("tests.Fixture"), ReflectionPermission::ALL);
        assert_eq!(store.resolve("shop.Cart"), ReflectionPermission::PUBLIC_ONLY);
    }

    #[test]
    fn test_invalid_permission_is_rejected() {
        let toml = r#"
[reflect.permissions]
global = "EVERYTHING"
"#;
        let err = InvestigatorConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, InvestigatorError::Config(_)));
        assert!(err.to_string().contains("EVERYTHING"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = InvestigatorConfig::from_toml_str("[investigator]\nverbose = true\n").unwrap_err();
        assert!(matches!(err, InvestigatorError::Config(_)));

        let err = InvestigatorConfig::from_toml_str("[investigator]\nno_parent_policy = \"maybe\"\n")
            .unwrap_err();
        assert!(matches!(err, InvestigatorError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("investigator.toml");
        std::fs::write(&path, "[investigator]\nno_parent_policy = \"false\"\n").unwrap();

        let config = InvestigatorConfig::load(&path).unwrap();
        assert_eq!(config.investigator.no_parent_policy, NoParentPolicy::False);

        let missing = dir.path().join("missing.toml");
        let err = InvestigatorConfig::load(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}

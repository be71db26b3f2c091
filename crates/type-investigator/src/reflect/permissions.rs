//! Reflection Security & Permissions
//!
//! Controls which dynamic operations the investigator may perform on a type.
//! Structural queries are always allowed; invocation and construction are
//! gated by permission flags.
//!
//! ## Resolution order
//!
//! 1. Exact class entry (`bank.Vault`)
//! 2. Class pattern rules (`bank.*`, `bank.**`, `*`), longest pattern first
//! 3. Global default (`ALL` unless configured)
//!
//! ## TOML Configuration
//!
//! ```toml
//! [reflect.permissions]
//! global = "ALL"
//!
//! [reflect.permissions.classes]
//! "bank.Vault" = "PUBLIC_ONLY"
//! "plugins.*" = "INVOKE_PUBLIC"
//! ```

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{InvestigatorError, InvestigatorResult};

/// Reflection permission flags (bitflags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReflectionPermission(u8);

impl ReflectionPermission {
    /// No reflective operation allowed
    pub const NONE: Self = Self(0x00);
    /// Invoke public methods
    pub const INVOKE_PUBLIC: Self = Self(0x01);
    /// Invoke non-public methods with access control bypassed
    pub const INVOKE_PRIVATE: Self = Self(0x02);
    /// Create instances through public constructors
    pub const INSTANTIATE: Self = Self(0x04);

    // Common combinations
    /// INVOKE_PUBLIC | INVOKE_PRIVATE
    pub const INVOKE_ALL: Self = Self(0x03);
    /// INVOKE_PUBLIC | INSTANTIATE
    pub const PUBLIC_ONLY: Self = Self(0x05);
    /// Everything
    pub const ALL: Self = Self(0x07);

    /// Create from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Get raw bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Check if permission contains a flag
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of permissions
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Difference (remove flags)
    pub const fn difference(&self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Parse a single flag name, or a hex / decimal bit value
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NONE" => Some(Self::NONE),
            "INVOKE_PUBLIC" => Some(Self::INVOKE_PUBLIC),
            "INVOKE_PRIVATE" => Some(Self::INVOKE_PRIVATE),
            "INSTANTIATE" => Some(Self::INSTANTIATE),
            "INVOKE_ALL" => Some(Self::INVOKE_ALL),
            "PUBLIC_ONLY" => Some(Self::PUBLIC_ONLY),
            "ALL" => Some(Self::ALL),
            _ => {
                if let Some(hex) = s.strip_prefix("0x") {
                    u8::from_str_radix(hex, 16).ok().map(Self::from_bits)
                } else {
                    s.parse::<u8>().ok().map(Self::from_bits)
                }
            }
        }
    }

    /// Parse combined flags from pipe-separated string (e.g., "INVOKE_PUBLIC|INSTANTIATE")
    pub fn from_combined_str(s: &str) -> Option<Self> {
        let mut result = Self::NONE;
        for part in s.split('|') {
            let perm = Self::parse(part.trim())?;
            result = result.union(perm);
        }
        Some(result)
    }
}

impl Default for ReflectionPermission {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for ReflectionPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NONE => f.write_str("NONE"),
            Self::INVOKE_PUBLIC => f.write_str("INVOKE_PUBLIC"),
            Self::INVOKE_PRIVATE => f.write_str("INVOKE_PRIVATE"),
            Self::INSTANTIATE => f.write_str("INSTANTIATE"),
            Self::INVOKE_ALL => f.write_str("INVOKE_ALL"),
            Self::PUBLIC_ONLY => f.write_str("PUBLIC_ONLY"),
            Self::ALL => f.write_str("ALL"),
            _ => write!(f, "0x{:02X}", self.0),
        }
    }
}

/// Wildcard rule over qualified class names
#[derive(Debug, Clone)]
pub struct ClassPermissionRule {
    /// Pattern (e.g., "plugins.*", "plugins.**", "*")
    pub pattern: String,
    /// Permissions for matching classes
    pub permissions: ReflectionPermission,
}

impl ClassPermissionRule {
    /// Check if a qualified class name matches this pattern.
    ///
    /// `pkg.*` matches every class below `pkg`; `pkg.**` additionally matches
    /// a class named exactly `pkg`.
    pub fn matches(&self, class_name: &str) -> bool {
        if self.pattern == "**" || self.pattern == "*" {
            return true;
        }

        if let Some(prefix) = self.pattern.strip_suffix(".**") {
            class_name == prefix || Self::is_below(class_name, prefix)
        } else if let Some(prefix) = self.pattern.strip_suffix(".*") {
            Self::is_below(class_name, prefix)
        } else {
            self.pattern == class_name
        }
    }

    fn is_below(class_name: &str, prefix: &str) -> bool {
        class_name.len() > prefix.len() + 1
            && class_name.starts_with(prefix)
            && class_name.as_bytes()[prefix.len()] == b'.'
    }
}

/// Store for reflection permissions
#[derive(Debug, Default)]
pub struct PermissionStore {
    /// Global default permissions
    global_default: ReflectionPermission,

    /// Class-level permissions: qualified name -> permissions
    class_permissions: FxHashMap<String, ReflectionPermission>,

    /// Pattern rules, longest pattern first
    class_rules: Vec<ClassPermissionRule>,

    /// Sealed classes (cannot modify permissions)
    sealed_classes: FxHashSet<String>,
}

impl PermissionStore {
    /// Create a new permission store with default (ALL) permissions
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a global default and a class/pattern table
    pub fn from_table(global: &str, classes: &BTreeMap<String, String>) -> InvestigatorResult<Self> {
        let mut store = Self::new();
        store.set_global(parse_config_value("global", global)?);
        for (key, value) in classes {
            let perms = parse_config_value(key, value)?;
            if key.contains('*') {
                store.add_class_rule(ClassPermissionRule {
                    pattern: key.clone(),
                    permissions: perms,
                });
            } else {
                store.set_class(key, perms)?;
            }
        }
        Ok(store)
    }

    /// Check if any permissions are configured. When false every check passes
    /// without resolving the class name.
    pub fn has_any_restrictions(&self) -> bool {
        self.global_default != ReflectionPermission::ALL
            || !self.class_permissions.is_empty()
            || !self.class_rules.is_empty()
    }

    // ===== Global Permissions =====

    /// Set global default permissions
    pub fn set_global(&mut self, permissions: ReflectionPermission) {
        self.global_default = permissions;
    }

    /// Get global default permissions
    pub fn global(&self) -> ReflectionPermission {
        self.global_default
    }

    // ===== Class Permissions =====

    /// Set class-level permissions
    pub fn set_class(&mut self, class_name: &str, permissions: ReflectionPermission) -> InvestigatorResult<()> {
        if self.sealed_classes.contains(class_name) {
            return Err(InvestigatorError::SealedPermissions(class_name.to_string()));
        }
        self.class_permissions.insert(class_name.to_string(), permissions);
        Ok(())
    }

    /// Get class-level permissions (not resolved)
    pub fn get_class(&self, class_name: &str) -> Option<ReflectionPermission> {
        self.class_permissions.get(class_name).copied()
    }

    /// Clear class-level permissions
    pub fn clear_class(&mut self, class_name: &str) -> InvestigatorResult<()> {
        if self.sealed_classes.contains(class_name) {
            return Err(InvestigatorError::SealedPermissions(class_name.to_string()));
        }
        self.class_permissions.remove(class_name);
        Ok(())
    }

    /// Seal class permissions
    pub fn seal_class(&mut self, class_name: &str) {
        self.sealed_classes.insert(class_name.to_string());
    }

    /// Check if class permissions are sealed
    pub fn is_class_sealed(&self, class_name: &str) -> bool {
        self.sealed_classes.contains(class_name)
    }

    /// Add a pattern rule
    pub fn add_class_rule(&mut self, rule: ClassPermissionRule) {
        self.class_rules.push(rule);
        self.class_rules
            .sort_by(|a, b| b.pattern.len().cmp(&a.pattern.len()));
    }

    // ===== Permission Resolution =====

    /// Resolve permissions for a class, checking all levels
    pub fn resolve(&self, class_name: &str) -> ReflectionPermission {
        if let Some(perms) = self.get_class(class_name) {
            return perms;
        }

        self.class_rules
            .iter()
            .find(|rule| rule.matches(class_name))
            .map(|rule| rule.permissions)
            .unwrap_or(self.global_default)
    }

    /// Check if a specific permission is allowed
    pub fn check_permission(&self, class_name: &str, required: ReflectionPermission) -> bool {
        self.resolve(class_name).contains(required)
    }
}

fn parse_config_value(key: &str, value: &str) -> InvestigatorResult<ReflectionPermission> {
    ReflectionPermission::from_combined_str(value).ok_or_else(|| {
        InvestigatorError::Config(format!("Invalid permission value for {}: {}", key, value))
    })
}

/// Check method invocation permission
pub fn check_invoke(store: &PermissionStore, class_name: &str, elevated: bool) -> InvestigatorResult<()> {
    let required = if elevated {
        ReflectionPermission::INVOKE_PRIVATE
    } else {
        ReflectionPermission::INVOKE_PUBLIC
    };
    require(store, class_name, required)
}

/// Check instance creation permission
pub fn check_instantiate(store: &PermissionStore, class_name: &str) -> InvestigatorResult<()> {
    require(store, class_name, ReflectionPermission::INSTANTIATE)
}

fn require(store: &PermissionStore, class_name: &str, required: ReflectionPermission) -> InvestigatorResult<()> {
    if !store.has_any_restrictions() || store.check_permission(class_name, required) {
        Ok(())
    } else {
        Err(InvestigatorError::PermissionDenied {
            type_name: class_name.to_string(),
            required,
        })
    }
}

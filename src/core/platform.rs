// ─── Platform ───
// Host descriptor (normalized OS name + architecture) and Mojang rule evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Normalized host platform used for rule evaluation and native selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// One of `windows`, `osx`, `linux` (or `unknown`).
    pub os: String,
    /// One of `x64`, `x86`, `arm64` or the raw target arch.
    pub arch: String,
}

impl Platform {
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: normalize_os(os).to_string(),
            arch: normalize_arch(arch).to_string(),
        }
    }

    /// Platform of the running process.
    pub fn host() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Value substituted for `${arch}` in native classifiers.
    pub fn arch_bits(&self) -> &'static str {
        match self.arch.as_str() {
            "x86" => "32",
            _ => "64",
        }
    }

    fn arch_matches(&self, rule_arch: &str) -> bool {
        match rule_arch {
            "x86" => self.arch == "x86",
            "x64" | "amd64" | "x86_64" => self.arch == "x64",
            "arm64" | "aarch64" => self.arch == "arm64",
            other => normalize_arch(other) == self.arch,
        }
    }
}

pub fn normalize_os(name: &str) -> &str {
    match name {
        "windows" => "windows",
        "macos" | "darwin" | "osx" => "osx",
        "linux" => "linux",
        _ => "unknown",
    }
}

pub fn normalize_arch(arch: &str) -> &str {
    match arch {
        "x86_64" | "amd64" | "x64" => "x64",
        "x86" | "i386" | "i686" | "386" => "x86",
        "aarch64" | "arm64" => "arm64",
        other => other,
    }
}

// ─── Rules ───

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OsRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Rule {
    /// Whether this rule applies to `platform`.
    ///
    /// No launcher features are enabled, so a rule requiring one never applies.
    pub fn applies_to(&self, platform: &Platform) -> bool {
        if self.features.values().any(|enabled| *enabled) {
            return false;
        }

        let Some(os) = &self.os else {
            return true;
        };

        let name_matches = os
            .name
            .as_deref()
            .map_or(true, |name| normalize_os(name) == platform.os);
        let arch_matches = os
            .arch
            .as_deref()
            .map_or(true, |arch| platform.arch_matches(arch));

        name_matches && arch_matches
    }
}

/// Evaluate a rule list (Mojang semantics).
///
/// - No rules → allowed.
/// - Otherwise start disallowed; every applicable rule overwrites the verdict,
///   so the last applicable rule wins and a rule without an OS clause sets
///   the baseline.
pub fn rules_allow(rules: &[Rule], platform: &Platform) -> bool {
    if rules.is_empty() {
        return true;
    }

    rules
        .iter()
        .filter(|rule| rule.applies_to(platform))
        .fold(false, |_, rule| rule.action == RuleAction::Allow)
}

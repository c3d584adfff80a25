use serde::Deserialize;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum OptionsError {
    #[error("Unknown option '{0}'")]
    UnknownKey(String),
    #[error("Invalid value for option '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("Options '{0}' and '{1}' cannot be combined")]
    Conflict(&'static str, &'static str),
    #[error("Invalid chain groups '{0}': expected '+'-separated runs of chain labels")]
    InvalidChainGroups(String),
    #[error("Splitting requires at least one of separate-models, separate-chains or chain-groups")]
    NoSplitSelected,
    #[error("Option '{0}' only applies when splitting a source into several structures")]
    SplitOnly(&'static str),
    #[error("TOML parsing error: {0}")]
    Parse(String),
}

/// The boolean options packed into a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OptionFlags(u32);

impl OptionFlags {
    pub const INCLUDE_HETATM: OptionFlags = OptionFlags(1);
    pub const INCLUDE_HYDROGEN: OptionFlags = OptionFlags(1 << 1);
    pub const JOIN_MODELS: OptionFlags = OptionFlags(1 << 2);
    pub const SEPARATE_MODELS: OptionFlags = OptionFlags(1 << 3);
    pub const SEPARATE_CHAINS: OptionFlags = OptionFlags(1 << 4);
    pub const SKIP_UNKNOWN: OptionFlags = OptionFlags(1 << 5);
    pub const HALT_AT_UNKNOWN: OptionFlags = OptionFlags(1 << 6);

    pub const fn empty() -> Self {
        OptionFlags(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: OptionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for OptionFlags {
    type Output = OptionFlags;

    fn bitor(self, rhs: OptionFlags) -> OptionFlags {
        OptionFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for OptionFlags {
    fn bitor_assign(&mut self, rhs: OptionFlags) {
        self.0 |= rhs.0;
    }
}

/// A value passed to [`StructureOptions::from_pairs`].
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Flag(bool),
    Text(String),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Flag(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

/// Inclusion, splitting and unknown-atom policy for structure construction.
///
/// Keys use kebab-case both in TOML and in [`from_pairs`](Self::from_pairs);
/// `hetatm` and `hydrogen` are accepted as short forms of the two inclusion flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct StructureOptions {
    #[serde(alias = "hetatm")]
    pub include_hetatm: bool,
    #[serde(alias = "hydrogen")]
    pub include_hydrogen: bool,
    pub join_models: bool,
    pub separate_models: bool,
    pub separate_chains: bool,
    pub skip_unknown: bool,
    pub halt_at_unknown: bool,
    pub chain_groups: Option<String>,
}

impl StructureOptions {
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = (&'a str, OptionValue)>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            let key = key.trim();
            if key == "chain-groups" {
                match value {
                    OptionValue::Text(groups) => options.chain_groups = Some(groups),
                    OptionValue::Flag(_) => {
                        return Err(OptionsError::InvalidValue {
                            key: key.to_string(),
                            reason: "expected a string".to_string(),
                        });
                    }
                }
                continue;
            }

            let flag = match key {
                "include-hetatm" | "hetatm" => &mut options.include_hetatm,
                "include-hydrogen" | "hydrogen" => &mut options.include_hydrogen,
                "join-models" => &mut options.join_models,
                "separate-models" => &mut options.separate_models,
                "separate-chains" => &mut options.separate_chains,
                "skip-unknown" => &mut options.skip_unknown,
                "halt-at-unknown" => &mut options.halt_at_unknown,
                _ => return Err(OptionsError::UnknownKey(key.to_string())),
            };
            match value {
                OptionValue::Flag(enabled) => *flag = enabled,
                OptionValue::Text(_) => {
                    return Err(OptionsError::InvalidValue {
                        key: key.to_string(),
                        reason: "expected a boolean".to_string(),
                    });
                }
            }
        }
        options.validate()?;
        Ok(options)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, OptionsError> {
        let options: Self =
            toml::from_str(content).map_err(|e| OptionsError::Parse(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_flags(flags: OptionFlags, chain_groups: Option<String>) -> Self {
        Self {
            include_hetatm: flags.contains(OptionFlags::INCLUDE_HETATM),
            include_hydrogen: flags.contains(OptionFlags::INCLUDE_HYDROGEN),
            join_models: flags.contains(OptionFlags::JOIN_MODELS),
            separate_models: flags.contains(OptionFlags::SEPARATE_MODELS),
            separate_chains: flags.contains(OptionFlags::SEPARATE_CHAINS),
            skip_unknown: flags.contains(OptionFlags::SKIP_UNKNOWN),
            halt_at_unknown: flags.contains(OptionFlags::HALT_AT_UNKNOWN),
            chain_groups,
        }
    }

    pub fn flags(&self) -> OptionFlags {
        let mut flags = OptionFlags::empty();
        for (enabled, flag) in [
            (self.include_hetatm, OptionFlags::INCLUDE_HETATM),
            (self.include_hydrogen, OptionFlags::INCLUDE_HYDROGEN),
            (self.join_models, OptionFlags::JOIN_MODELS),
            (self.separate_models, OptionFlags::SEPARATE_MODELS),
            (self.separate_chains, OptionFlags::SEPARATE_CHAINS),
            (self.skip_unknown, OptionFlags::SKIP_UNKNOWN),
            (self.halt_at_unknown, OptionFlags::HALT_AT_UNKNOWN),
        ] {
            if enabled {
                flags |= flag;
            }
        }
        flags
    }

    /// Checks the options for conflicting flags and malformed chain groups.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.chain_groups.is_some() && self.separate_chains {
            return Err(OptionsError::Conflict("chain-groups", "separate-chains"));
        }
        if self.skip_unknown && self.halt_at_unknown {
            return Err(OptionsError::Conflict("skip-unknown", "halt-at-unknown"));
        }
        if self.join_models && self.separate_models {
            return Err(OptionsError::Conflict("join-models", "separate-models"));
        }
        self.chain_groups()?;
        Ok(())
    }

    /// [`validate`](Self::validate), plus the requirement that some split is requested.
    pub fn validate_for_split(&self) -> Result<(), OptionsError> {
        self.validate()?;
        if !(self.separate_models || self.separate_chains || self.chain_groups.is_some()) {
            return Err(OptionsError::NoSplitSelected);
        }
        Ok(())
    }

    /// [`validate`](Self::validate), plus the requirement that no split option is set.
    ///
    /// Single structures honor only the inclusion flags, `join-models` and the unknown-atom
    /// policy.
    pub fn validate_for_structure(&self) -> Result<(), OptionsError> {
        self.validate()?;
        for (enabled, name) in [
            (self.separate_models, "separate-models"),
            (self.separate_chains, "separate-chains"),
            (self.chain_groups.is_some(), "chain-groups"),
        ] {
            if enabled {
                return Err(OptionsError::SplitOnly(name));
            }
        }
        Ok(())
    }

    /// The parsed chain groups, in listed order. Empty when no groups are set.
    pub fn chain_groups(&self) -> Result<Vec<String>, OptionsError> {
        let Some(spec) = self.chain_groups.as_deref() else {
            return Ok(Vec::new());
        };
        spec.split('+')
            .map(|group| {
                let group = group.trim();
                if group.is_empty() || !group.chars().all(|c| c.is_ascii_alphabetic()) {
                    Err(OptionsError::InvalidChainGroups(spec.to_string()))
                } else {
                    Ok(group.to_string())
                }
            })
            .collect()
    }
}

impl fmt::Display for StructureOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        for (enabled, name) in [
            (self.include_hetatm, "include-hetatm"),
            (self.include_hydrogen, "include-hydrogen"),
            (self.join_models, "join-models"),
            (self.separate_models, "separate-models"),
            (self.separate_chains, "separate-chains"),
            (self.skip_unknown, "skip-unknown"),
            (self.halt_at_unknown, "halt-at-unknown"),
        ] {
            if enabled {
                names.push(name.to_string());
            }
        }
        if let Some(groups) = &self.chain_groups {
            names.push(format!("chain-groups={}", groups));
        }
        if names.is_empty() {
            f.write_str("(defaults)")
        } else {
            f.write_str(&names.join(", "))
        }
    }
}

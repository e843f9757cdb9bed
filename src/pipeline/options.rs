//! Option store shared by the stages of a reduction stack
//!
//! `Options` is a snapshot of the key/value pairs supplied by the operator.
//! Stages declare the options they read through an `OptionGroup` and parse
//! them with `add_and_parse`. Values a stage synthesizes for the stages below
//! it never mutate the snapshot they were derived from: `with_derived` returns
//! a new snapshot instead.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use super::error::SetupError;

/// Declaration of a single option.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub name: &'static str,
    pub default: String,
    pub keep: bool,
    pub help: &'static str,
}

impl OptionSpec {
    pub fn new(name: &'static str, default: impl Display) -> Self {
        Self {
            name,
            default: default.to_string(),
            keep: false,
            help: "",
        }
    }

    /// Mark the option to be persisted with the run when it was supplied.
    pub fn keep(mut self) -> Self {
        self.keep = true;
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }
}

/// A named group of option declarations owned by one stage.
#[derive(Debug, Clone)]
pub struct OptionGroup {
    pub name: &'static str,
    pub specs: Vec<OptionSpec>,
}

impl OptionGroup {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            specs: Vec::new(),
        }
    }

    pub fn add(mut self, spec: OptionSpec) -> Self {
        self.specs.push(spec);
        self
    }
}

/// Result of parsing an `OptionGroup`: every declared option resolved to either
/// its supplied value or its default.
#[derive(Debug, Clone)]
pub struct ParsedGroup {
    values: BTreeMap<&'static str, (String, bool)>,
    kept: Vec<(String, String)>,
}

impl ParsedGroup {
    /// Typed value of a declared option.
    pub fn get<T>(&self, name: &str) -> Result<T, SetupError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let (raw, _) = self
            .values
            .get(name)
            .ok_or_else(|| SetupError::InvalidOptionValue {
                name: name.to_string(),
                value: String::new(),
                reason: "option was not declared".to_string(),
            })?;
        parse_value(name, raw)
    }

    pub fn was_supplied(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|(_, supplied)| *supplied)
    }

    /// Supplied options declared with `keep`, as `(name, value)` pairs in declaration order.
    pub fn kept(&self) -> &[(String, String)] {
        &self.kept
    }
}

/// Snapshot of supplied options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    supplied: BTreeMap<String, String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion used while assembling the snapshot from the CLI.
    pub fn insert(mut self, name: &str, value: impl Display) -> Self {
        self.supplied.insert(name.to_string(), value.to_string());
        self
    }

    pub fn was_supplied(&self, name: &str) -> bool {
        self.supplied.contains_key(name)
    }

    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.supplied.get(name).map(String::as_str)
    }

    /// Typed value of a supplied option, `None` if absent.
    pub fn parse<T>(&self, name: &str) -> Result<Option<T>, SetupError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get_raw(name).map(|raw| parse_value(name, raw)).transpose()
    }

    /// Resolve a stage's declarations against this snapshot.
    pub fn add_and_parse(&self, group: &OptionGroup) -> ParsedGroup {
        let mut values = BTreeMap::new();
        let mut kept = Vec::new();
        for spec in &group.specs {
            let entry = match self.supplied.get(spec.name) {
                Some(value) => {
                    if spec.keep {
                        kept.push((spec.name.to_string(), value.clone()));
                    }
                    (value.clone(), true)
                }
                None => (spec.default.clone(), false),
            };
            values.insert(spec.name, entry);
        }
        ParsedGroup { values, kept }
    }

    /// New snapshot with `derived` values layered on top of this one.
    pub fn with_derived(&self, derived: &[(String, String)]) -> Self {
        let mut next = self.clone();
        for (name, value) in derived {
            next.supplied.insert(name.clone(), value.clone());
        }
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.supplied.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, SetupError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| SetupError::InvalidOptionValue {
            name: name.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

//! Source locators: the `type://name.format` address of one data source.
//!
//! Both `type` and `format` are optional in the raw string and fall back to
//! [`LocatorDefaults`]. Equality and hashing look only at the raw string, so
//! `accounts` and `file://accounts.ct` are different locators even when the
//! defaults would resolve them to the same file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

pub const TYPE_SEPARATOR: &str = "://";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorDefaults {
    pub medium: String,
    pub name: String,
    pub format: String,
}

impl Default for LocatorDefaults {
    fn default() -> Self {
        Self {
            medium: "file".to_string(),
            name: "accounts".to_string(),
            format: "ct".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceLocator {
    raw: String,
    medium: String,
    name: String,
    format: String,
}

impl SourceLocator {
    pub fn parse(raw: &str, defaults: &LocatorDefaults) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::default();
        }

        let (medium, rest) = match raw.split_once(TYPE_SEPARATOR) {
            Some((medium, rest)) if !medium.is_empty() => (medium.to_string(), rest),
            Some((_, rest)) => (defaults.medium.clone(), rest),
            None => (defaults.medium.clone(), raw),
        };

        // Only the last path segment may carry the format, so a dotted
        // directory name is never mistaken for one.
        let segment_start = rest.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (name, format) = match rest[segment_start..].rfind('.') {
            Some(dot) if dot > 0 => {
                let split = segment_start + dot;
                let format = &rest[split + 1..];
                let format = if format.is_empty() {
                    defaults.format.clone()
                } else {
                    format.to_string()
                };
                (rest[..split].to_string(), format)
            }
            _ => (rest.to_string(), defaults.format.clone()),
        };

        Self {
            raw: raw.to_string(),
            medium,
            name,
            format,
        }
    }

    /// Builds a locator from explicit parts; the raw form only contains the
    /// parts that were given.
    pub fn from_parts(
        name: &str,
        medium: Option<&str>,
        format: Option<&str>,
        defaults: &LocatorDefaults,
    ) -> Self {
        let mut raw = String::new();
        if let Some(medium) = medium {
            raw.push_str(medium);
            raw.push_str(TYPE_SEPARATOR);
        }
        raw.push_str(name);
        if let Some(format) = format {
            raw.push('.');
            raw.push_str(format);
        }
        Self::parse(&raw, defaults)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn medium(&self) -> &str {
        &self.medium
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Fully resolved form, `type://name.format`.
    pub fn full(&self) -> String {
        format!(
            "{}{}{}.{}",
            self.medium, TYPE_SEPARATOR, self.name, self.format
        )
    }
}

impl PartialEq for SourceLocator {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for SourceLocator {}

impl Hash for SourceLocator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("<none>");
        }
        f.write_str(&self.full())
    }
}

//! Semantic versions and the installed → recommended version delta.
//!
//! [`ParsedVersion`] compares on its `major.minor.patch` core only; any
//! pre-release or package-revision suffix (`0.7.1-1`) is carried for display
//! but never affects equality or ordering.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use colored::Colorize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// ParsedVersion
// ---------------------------------------------------------------------------

/// A `major.minor.patch` triple with optional metadata (`-1`, `+build`).
#[derive(Debug, Clone)]
pub struct ParsedVersion {
    major: u64,
    minor: u64,
    patch: u64,
    /// Suffix including its leading `-` or `+`.
    metadata: Option<String>,
}

impl ParsedVersion {
    /// Build a metadata-free version from its core triple.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            metadata: None,
        }
    }

    /// Parse `X.Y.Z`, `vX.Y.Z`, `X.Y.Z-N` or `X.Y.Z+build`.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        let text = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let (core, metadata) = match text.find(['-', '+']) {
            Some(idx) => (&text[..idx], Some(&text[idx..])),
            None => (text, None),
        };

        if let Some(meta) = metadata {
            if meta.len() < 2 {
                return Err(CoreError::VersionParse {
                    input: input.to_string(),
                    reason: "empty metadata suffix".to_string(),
                });
            }
        }

        let parsed = semver::Version::parse(core).map_err(|e| CoreError::VersionParse {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            metadata: metadata.map(str::to_string),
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// Suffix after the core, without its leading `-` / `+`.
    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref().map(|m| &m[1..])
    }

    /// The same version with metadata stripped.
    pub fn core(&self) -> ParsedVersion {
        ParsedVersion::new(self.major, self.minor, self.patch)
    }

    /// `major.minor.patch` as text.
    pub fn core_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(meta) = &self.metadata {
            f.write_str(meta)?;
        }
        Ok(())
    }
}

impl FromStr for ParsedVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParsedVersion::parse(s)
    }
}

impl PartialEq for ParsedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.triple() == other.triple()
    }
}

impl Eq for ParsedVersion {}

impl Hash for ParsedVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.triple().hash(state);
    }
}

impl PartialOrd for ParsedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ParsedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple())
    }
}

// ---------------------------------------------------------------------------
// VersionDiff
// ---------------------------------------------------------------------------

/// Direction of a required version change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upgrade,
    Downgrade,
    NoChange,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upgrade => write!(f, "upgrade"),
            Direction::Downgrade => write!(f, "downgrade"),
            Direction::NoChange => write!(f, "no-change"),
        }
    }
}

/// Installed (`from`) → recommended (`to`) delta. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionDiff {
    pub from: Option<ParsedVersion>,
    pub to: Option<ParsedVersion>,
}

impl VersionDiff {
    pub fn compare(from: Option<ParsedVersion>, to: Option<ParsedVersion>) -> Self {
        Self { from, to }
    }

    /// `false` whenever either side is absent.
    pub fn is_same_version(&self) -> bool {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => from == to,
            _ => false,
        }
    }

    /// `None` unless both sides are present.
    pub fn direction(&self) -> Option<Direction> {
        let (from, to) = (self.from.as_ref()?, self.to.as_ref()?);
        Some(match to.cmp(from) {
            Ordering::Equal => Direction::NoChange,
            Ordering::Greater => Direction::Upgrade,
            Ordering::Less => Direction::Downgrade,
        })
    }

    /// `=`, `↑` or `↓`, coloured when the output supports it.
    pub fn direction_symbol(&self) -> String {
        match self.direction() {
            Some(Direction::NoChange) => "=".dimmed().to_string(),
            Some(Direction::Upgrade) => "↑".green().bold().to_string(),
            Some(Direction::Downgrade) => "↓".red().bold().to_string(),
            None => "?".to_string(),
        }
    }
}

impl fmt::Display for VersionDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |v: &Option<ParsedVersion>| {
            v.as_ref()
                .map(ParsedVersion::core_string)
                .unwrap_or_else(|| "unknown".to_string())
        };
        write!(f, "{} -> {}", side(&self.from), side(&self.to))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

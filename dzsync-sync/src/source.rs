//! Recommended-version resolver.
//!
//! The DoubleZero setup page shows one install command per cluster, e.g.
//!
//! ```text
//! The current recommended deployment for Mainnet-Beta is:
//!     sudo apt-get install doublezero=0.7.1-1
//! The current recommended deployment for Testnet is:
//!     sudo apt-get install doublezero=0.7.2-1
//! ```
//!
//! # Binding install commands to clusters
//!
//! Code blocks (`<code>`, or a `<pre>` with a `<code>` child, counted once)
//! are scanned in document order and every install match they hold is
//! collected. The narrative text since the previous matching block is
//! searched for a `current recommended deployment for <cluster> is` marker;
//! the last marker found binds the block's first match to that cluster
//! (first binding wins). Inline `<code>` without an install command is part
//! of the narrative.
//!
//! When the page carries no markers at all, matches are assigned by
//! position: first to `mainnet-beta`, second to `testnet`.

use std::collections::BTreeMap;
use std::time::Duration;

use regex::Regex;
use scraper::{ElementRef, Html};

use dzsync_core::{Cluster, ParsedVersion};

use crate::error::SyncError;

/// `User-Agent` sent with every documentation request.
pub const USER_AGENT: &str = concat!("doublezero-version-sync/", env!("CARGO_PKG_VERSION"));

/// Timeout applied to each documentation fetch.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Package whose install command is searched for.
pub const DEFAULT_PACKAGE: &str = "doublezero";

// ---------------------------------------------------------------------------
// DocumentFetcher
// ---------------------------------------------------------------------------

/// Retrieves the documentation page body.
pub trait DocumentFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, SyncError>;
}

/// Blocking HTTP fetcher with a fixed timeout and user agent.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        HttpFetcher {
            agent: ureq::AgentBuilder::new()
                .timeout(HTTP_TIMEOUT)
                .user_agent(USER_AGENT)
                .build(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, SyncError> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(SyncError::HttpStatus {
                    url: url.to_string(),
                    status,
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(SyncError::Fetch {
                    url: url.to_string(),
                    reason: transport.to_string(),
                })
            }
        };

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(SyncError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        response.into_string().map_err(|source| SyncError::Body {
            url: url.to_string(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// RecommendedVersions
// ---------------------------------------------------------------------------

/// How the install matches of one document were assigned to clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// At least one cluster marker was found on the page.
    Marker,
    /// No markers; matches assigned in document order.
    Positional,
}

/// Cluster → package version map built from a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendedVersions {
    by_cluster: BTreeMap<Cluster, String>,
    matches: usize,
    binding: Binding,
}

impl RecommendedVersions {
    /// Package version (`0.7.1-1`) recommended for `cluster`.
    pub fn get(&self, cluster: Cluster) -> Result<&str, SyncError> {
        if let Some(version) = self.by_cluster.get(&cluster) {
            return Ok(version);
        }
        match self.binding {
            Binding::Positional => Err(SyncError::ClusterNotFound {
                cluster,
                found: self.matches,
            }),
            Binding::Marker => Err(SyncError::AmbiguousLayout {
                cluster,
                marked: self
                    .by_cluster
                    .keys()
                    .map(Cluster::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Number of code blocks that contained an install command.
    pub fn matches(&self) -> usize {
        self.matches
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }
}

// ---------------------------------------------------------------------------
// VersionSource
// ---------------------------------------------------------------------------

/// Resolves the recommended package version for a cluster from the docs.
pub struct VersionSource {
    fetcher: Box<dyn DocumentFetcher>,
    url: String,
    package: String,
    install_pattern: Regex,
    markers: Vec<(Cluster, Regex)>,
}

impl VersionSource {
    pub fn new(fetcher: Box<dyn DocumentFetcher>, url: impl Into<String>) -> Result<Self, SyncError> {
        Self::for_package(fetcher, url, DEFAULT_PACKAGE)
    }

    /// Resolver looking for `<tool> install <package>=X.Y.Z-N`.
    pub fn for_package(
        fetcher: Box<dyn DocumentFetcher>,
        url: impl Into<String>,
        package: &str,
    ) -> Result<Self, SyncError> {
        let install_pattern = Regex::new(&format!(
            r"(?m)(?:^|\s)(?:sudo\s+)?[a-z][\w.-]*\s+install\s+(?:\S+\s+)*?{}=(\d+\.\d+\.\d+-\d+)",
            regex::escape(package)
        ))?;

        let mut markers = Vec::with_capacity(Cluster::all().len());
        for cluster in Cluster::all() {
            let pattern = format!(
                r"(?i)current\s+recommended\s+deployment\s+for\s+{}\s+is",
                regex::escape(cluster.as_str())
            );
            markers.push((*cluster, Regex::new(&pattern)?));
        }

        Ok(VersionSource {
            fetcher,
            url: url.into(),
            package: package.to_string(),
            install_pattern,
            markers,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the docs and return the package version for `cluster`.
    pub fn resolve(&self, cluster: Cluster) -> Result<String, SyncError> {
        let body = self.fetcher.fetch(&self.url)?;
        let versions = self.extract(&body)?;
        let version = versions.get(cluster)?.to_string();
        tracing::debug!(
            cluster = %cluster,
            version = %version,
            binding = ?versions.binding(),
            matches = versions.matches(),
            "parsed version from docs"
        );
        Ok(version)
    }

    /// Fetch the docs and return the recommended semantic version for
    /// `cluster`, with the package revision stripped.
    pub fn recommended_version(&self, cluster: Cluster) -> Result<ParsedVersion, SyncError> {
        let package_version = self.resolve(cluster)?;
        let semver = package_version
            .split('-')
            .next()
            .unwrap_or(package_version.as_str());
        let version = ParsedVersion::parse(semver).map_err(|source| SyncError::VersionParse {
            text: package_version.clone(),
            source,
        })?;
        tracing::info!(cluster = %cluster, version = %version, "recommended version");
        Ok(version)
    }

    /// Build the cluster map from an HTML document. Pure.
    pub fn extract(&self, html: &str) -> Result<RecommendedVersions, SyncError> {
        let document = Html::parse_document(html);

        let mut narrative = String::new();
        let mut positional: Vec<String> = Vec::new();
        let mut bound: BTreeMap<Cluster, String> = BTreeMap::new();
        let mut marked = false;

        for node in document.root_element().descendants() {
            if let Some(text) = node.value().as_text() {
                let in_block = node
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|a| self.hides_narrative(a));
                if !in_block {
                    narrative.push_str(text);
                    narrative.push(' ');
                }
                continue;
            }

            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            if !is_code_block(element) {
                continue;
            }

            let block_text: String = element.text().collect();
            let found: Vec<String> = self
                .install_pattern
                .captures_iter(&block_text)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .collect();
            let Some(first) = found.first() else {
                continue;
            };

            if let Some(cluster) = self.last_marker(&narrative) {
                marked = true;
                bound.entry(cluster).or_insert_with(|| first.clone());
            }
            narrative.clear();
            positional.extend(found);
        }

        if positional.is_empty() {
            return Err(SyncError::Parse {
                package: self.package.clone(),
            });
        }
        if !marked && self.last_marker(&narrative).is_some() {
            marked = true;
        }

        let binding = if marked {
            Binding::Marker
        } else {
            for cluster in Cluster::all() {
                if let Some(version) = positional.get(cluster.position()) {
                    bound.insert(*cluster, version.clone());
                }
            }
            Binding::Positional
        };

        Ok(RecommendedVersions {
            by_cluster: bound,
            matches: positional.len(),
            binding,
        })
    }

    /// Text under `element` is not narrative: `<pre>`, `<script>`, `<style>`,
    /// or a `<code>` holding an install command. Inline code such as
    /// `for <code>testnet</code> is` stays narrative.
    fn hides_narrative(&self, element: ElementRef<'_>) -> bool {
        match element.value().name() {
            "pre" | "script" | "style" => true,
            "code" => {
                let text: String = element.text().collect();
                self.install_pattern.is_match(&text)
            }
            _ => false,
        }
    }

    /// Cluster named by the last marker occurring in `text`.
    fn last_marker(&self, text: &str) -> Option<Cluster> {
        self.markers
            .iter()
            .filter_map(|(cluster, re)| re.find_iter(text).last().map(|m| (m.start(), *cluster)))
            .max_by_key(|(start, _)| *start)
            .map(|(_, cluster)| cluster)
    }
}

/// `<pre>` with a `<code>` child, or a `<code>` outside any `<pre>`/`<code>`.
fn is_code_block(element: ElementRef<'_>) -> bool {
    let nested = element.ancestors().any(|a| {
        a.value()
            .as_element()
            .map_or(false, |e| matches!(e.name(), "pre" | "code"))
    });
    if nested {
        return false;
    }
    match element.value().name() {
        "code" => true,
        "pre" => element.children().any(|c| {
            c.value()
                .as_element()
                .map_or(false, |e| e.name() == "code")
        }),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

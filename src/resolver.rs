//! Dependency resolution
//!
//! Orchestrates the multi-file loading pipeline: parse the main file for
//! first-level references, fetch them as one concurrent round, parse any
//! fetched material libraries for second-level texture references, fetch
//! those as a second round, and aggregate everything into an [`AssetSet`].
//!
//! Failures are isolated per dependency: a missing texture or material
//! degrades that asset and the load continues. Resolution itself only stops
//! when the session is cancelled.

use crate::cache::DependencyCache;
use crate::fetch::{normalize_reference, FetchError, FetchedFile, FileFetcher};
use crate::model::{AssetOutcome, AssetSet, DependencyReference, DependencyRole, ModelReference, ResolvedAsset};
use crate::parser::{self, ParseDiagnostic};
use crate::session::CancelToken;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Resolution stops only for cancellation; everything else degrades
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("load session was cancelled")]
    Cancelled,
}

/// Aggregated resolution output
#[derive(Debug, Default, Clone)]
pub struct ResolutionReport {
    pub assets: AssetSet,
    /// Parse diagnostics from the main file and any material libraries
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Resolves a main file's dependency graph against a fetcher and cache
pub struct DependencyResolver<F: FileFetcher> {
    fetcher: Arc<F>,
    cache: Arc<DependencyCache>,
}

impl<F: FileFetcher> DependencyResolver<F> {
    pub fn new(fetcher: Arc<F>, cache: Arc<DependencyCache>) -> Self {
        Self { fetcher, cache }
    }

    /// Resolve all dependencies of `model`, whose main content is `main`.
    ///
    /// Cancellation is polled before parsing and before each fetch round,
    /// so at most one in-flight round of work is wasted.
    pub async fn resolve(
        &self,
        model: &ModelReference,
        main: &[u8],
        cancel: &CancelToken,
    ) -> Result<ResolutionReport, ResolveError> {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let outcome = parser::parse_dependencies(main, model.format);
        let mut diagnostics = outcome.diagnostics;
        let mut assets = AssetSet::new();
        // Normalized-key -> outcome, deduplicating transport fetches across
        // rounds and across references that normalize to the same target.
        let mut fetched: HashMap<String, AssetOutcome> = HashMap::new();

        if outcome.references.is_empty() {
            log::debug!("{} has no external dependencies", model.name);
            return Ok(ResolutionReport {
                assets,
                diagnostics,
            });
        }

        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        log::debug!(
            "fetching {} first-level dependencies for {}",
            outcome.references.len(),
            model.name
        );
        for asset in self
            .fetch_round(&model.container, outcome.references, &mut fetched)
            .await
        {
            assets.insert(asset);
        }

        // Second hop: textures named inside successfully fetched material
        // libraries.
        let mut second: Vec<DependencyReference> = Vec::new();
        for asset in assets.iter() {
            if asset.reference.role != DependencyRole::Material {
                continue;
            }
            let Some(bytes) = asset.bytes() else { continue };
            let mtl_outcome = parser::obj::parse_mtl(bytes);
            diagnostics.extend(mtl_outcome.diagnostics);
            for reference in mtl_outcome.references {
                if !assets.contains(&reference.raw)
                    && !second.iter().any(|r| r.raw == reference.raw)
                {
                    second.push(reference);
                }
            }
        }

        if !second.is_empty() {
            if cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
            log::debug!(
                "fetching {} second-level dependencies for {}",
                second.len(),
                model.name
            );
            for asset in self
                .fetch_round(&model.container, second, &mut fetched)
                .await
            {
                assets.insert(asset);
            }
        }

        let degraded = assets.degraded().len();
        if degraded > 0 {
            log::warn!(
                "{} resolved with {degraded} degraded dependencies",
                model.name
            );
        }
        Ok(ResolutionReport {
            assets,
            diagnostics,
        })
    }

    /// Fetch one round of references concurrently.
    ///
    /// References are keyed by their normalized path; each key reaches the
    /// transport at most once per session, and every reference sharing a
    /// key shares the outcome. Aggregation follows input order, never
    /// completion order.
    async fn fetch_round(
        &self,
        container: &str,
        references: Vec<DependencyReference>,
        fetched: &mut HashMap<String, AssetOutcome>,
    ) -> Vec<ResolvedAsset> {
        let keyed: Vec<(DependencyReference, Result<String, FetchError>)> = references
            .into_iter()
            .map(|reference| {
                let key = normalize_reference(container, &reference.raw);
                (reference, key)
            })
            .collect();

        let mut round_keys: HashSet<&str> = HashSet::new();
        let mut to_fetch: Vec<(&str, &str)> = Vec::new();
        for (reference, key) in &keyed {
            if let Ok(key) = key {
                if !fetched.contains_key(key.as_str()) && round_keys.insert(key.as_str()) {
                    to_fetch.push((key.as_str(), reference.raw.as_str()));
                }
            }
        }

        let outcomes = join_all(
            to_fetch
                .iter()
                .map(|(key, raw)| self.fetch_one(container, key, raw)),
        )
        .await;
        for ((key, _), outcome) in to_fetch.iter().zip(outcomes) {
            fetched.insert(key.to_string(), outcome);
        }

        keyed
            .into_iter()
            .map(|(reference, key)| match key {
                Err(err) => ResolvedAsset::failed(reference, err),
                Ok(key) => match fetched.get(&key) {
                    Some(AssetOutcome::Fetched(file)) => {
                        ResolvedAsset::fetched(reference, file.clone())
                    }
                    Some(AssetOutcome::Failed(err)) => {
                        ResolvedAsset::failed(reference, err.clone())
                    }
                    // Key was scheduled above, so this branch is unreachable
                    None => ResolvedAsset::failed(
                        reference,
                        FetchError::Transport("fetch result missing".to_string()),
                    ),
                },
            })
            .collect()
    }

    /// Cache-first fetch of a single normalized target
    async fn fetch_one(&self, container: &str, key: &str, raw: &str) -> AssetOutcome {
        if let Some(bytes) = self.cache.get(key) {
            log::debug!("cache hit for {key:?}");
            return AssetOutcome::Fetched(FetchedFile {
                bytes,
                version: "cache".to_string(),
            });
        }
        match self.fetcher.fetch_dependency(container, raw).await {
            Ok(file) => {
                self.cache.insert(key, &file.version, file.bytes.clone());
                AssetOutcome::Fetched(file)
            }
            Err(err) => {
                log::warn!("dependency {raw:?} failed to fetch: {err}");
                AssetOutcome::Failed(err)
            }
        }
    }
}

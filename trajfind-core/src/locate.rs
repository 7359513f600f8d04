use crate::config::{LocatorConfig, Strategy};
use crate::error::LocateError;
use tracing::{debug, error, warn};
use trajfind_scanner::{
    CandidateContainer, GraphScanner, HostNode, PayloadExtractor, TrajectoryRecord, resolve_path,
};

/// Runs the configured strategies against a host graph, in order.
pub struct TrajectoryLocator {
    strategies: Vec<Strategy>,
    scanner: GraphScanner,
    extractor: PayloadExtractor,
}

impl TrajectoryLocator {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self {
            strategies,
            scanner: GraphScanner::new(),
            extractor: PayloadExtractor::new(),
        }
    }

    pub fn from_config(config: &LocatorConfig) -> Self {
        Self::new(config.strategies.clone()).with_scanner(config.scanner())
    }

    pub fn with_scanner(mut self, scanner: GraphScanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// First record found by any strategy.
    ///
    /// Strategy failures are logged and never escape: an unresolvable root
    /// is a warning, a scan failure is an error, and both move on to the
    /// next strategy.
    pub fn locate<N: HostNode>(&self, root: &N) -> Option<TrajectoryRecord> {
        for (idx, strategy) in self.strategies.iter().enumerate() {
            match self.locate_with(root, strategy) {
                Ok(Some(record)) => {
                    debug!("Trajectory found via strategy {}: {}", idx + 1, strategy);
                    return Some(record);
                }
                Ok(None) => {
                    debug!("Strategy {} found no trajectory: {}", idx + 1, strategy);
                }
                Err(e @ LocateError::PathNotFound(_)) => {
                    warn!("Strategy {}: {}", idx + 1, e);
                }
                Err(e) => {
                    error!("Strategy {}: {}", idx + 1, e);
                }
            }
        }
        None
    }

    /// Evaluate a single strategy without swallowing its failure.
    pub fn locate_with<N: HostNode>(
        &self,
        root: &N,
        strategy: &Strategy,
    ) -> Result<Option<TrajectoryRecord>, LocateError> {
        let base = resolve_path(root, &strategy.root_path)?
            .ok_or_else(|| LocateError::PathNotFound(strategy.root_path.clone()))?;

        let candidates = self.scanner.scan(&base)?;
        if candidates.is_empty() {
            warn!(
                "No '{}' objects found under {}",
                self.scanner.marker_key(),
                strategy
            );
            return Ok(None);
        }

        for candidate in Self::prioritize(candidates, &strategy.preferred_path_substring) {
            if let Some(record) = self.extractor.extract(&candidate)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Containers whose path contains `preferred` first, then the rest,
    /// each group keeping discovery order.
    fn prioritize<N>(
        candidates: Vec<CandidateContainer<N>>,
        preferred: &str,
    ) -> Vec<CandidateContainer<N>> {
        let (mut ordered, fallback): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|candidate| candidate.matches_preference(preferred));
        ordered.extend(fallback);
        ordered
    }
}

impl Default for TrajectoryLocator {
    fn default() -> Self {
        Self::from_config(&LocatorConfig::default())
    }
}

use crate::error::{Result, ScanError};
use crate::graph::HostNode;
use crate::result::CandidateContainer;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

pub const DEFAULT_MARKER_KEY: &str = "questions";

/// Depth-first search for marker containers in a host graph.
pub struct GraphScanner {
    marker_key: String,
    max_depth: Option<usize>,
    max_nodes: Option<usize>,
    progress_callback: Option<ProgressCallback>,
}

struct Frame<N> {
    node: N,
    path: String,
    keys: Vec<String>,
    next: usize,
    depth: usize,
}

impl<N: HostNode> Frame<N> {
    fn open(node: N, path: String, depth: usize) -> Result<Self> {
        let keys = node.keys()?;
        Ok(Self {
            node,
            path,
            keys,
            next: 0,
            depth,
        })
    }
}

impl GraphScanner {
    pub fn new() -> Self {
        Self::with_marker_key(DEFAULT_MARKER_KEY)
    }

    pub fn with_marker_key(marker_key: impl Into<String>) -> Self {
        Self {
            marker_key: marker_key.into(),
            max_depth: None,
            max_nodes: None,
            progress_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_nodes(mut self, nodes: usize) -> Self {
        self.max_nodes = Some(nodes);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn marker_key(&self) -> &str {
        &self.marker_key
    }

    /// Collect every object-valued property named after the marker key.
    ///
    /// Parents are reported before their children and siblings in host
    /// enumeration order. Each object identity is descended into at most once,
    /// so when a sub-object is shared the first path that reaches it wins.
    /// A marker container is still descended into, since containers may nest.
    pub fn scan<N: HostNode>(&self, root: &N) -> Result<Vec<CandidateContainer<N>>> {
        let mut candidates = Vec::new();
        let Some(root_id) = root.identity() else {
            debug!("Scan root is not an object, nothing to traverse");
            return Ok(candidates);
        };

        let mut visited: HashSet<usize> = HashSet::new();
        visited.insert(root_id);

        // Explicit stack so deep host graphs cannot overflow the native stack
        let mut stack = vec![Frame::open(root.clone(), String::new(), 0)?];

        while let Some(frame) = stack.last_mut() {
            if frame.next >= frame.keys.len() {
                stack.pop();
                continue;
            }
            let key = frame.keys[frame.next].clone();
            frame.next += 1;

            // The host may have removed the key since it was enumerated
            let Some(value) = frame.node.get(&key)? else {
                continue;
            };
            if !value.is_object() {
                continue;
            }

            let depth = frame.depth + 1;
            let path = if frame.path.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", frame.path, key)
            };

            if let Some(max_depth) = self.max_depth
                && depth > max_depth
            {
                debug!("Depth limit {} reached at {}", max_depth, path);
                continue;
            }

            if key == self.marker_key {
                debug!("Found '{}' container at {}", self.marker_key, path);
                candidates.push(CandidateContainer::new(path.clone(), value.clone()));
            }

            let Some(id) = value.identity() else {
                continue;
            };
            if !visited.insert(id) {
                continue;
            }
            if let Some(max_nodes) = self.max_nodes
                && visited.len() > max_nodes
            {
                return Err(ScanError::NodeLimitExceeded(max_nodes));
            }

            if let Some(ref callback) = self.progress_callback {
                callback(visited.len(), path.clone());
            }

            stack.push(Frame::open(value, path, depth)?);
        }

        debug!(
            "Scan complete. Visited {} objects, found {} '{}' containers",
            visited.len(),
            candidates.len(),
            self.marker_key
        );
        Ok(candidates)
    }
}

impl Default for GraphScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk a dotted path from `base`.
///
/// Fails fast with `Ok(None)` as soon as a segment is missing or falsy, so a
/// present `0` or `""` counts as absent. An empty path resolves to `base`.
pub fn resolve_path<N: HostNode>(base: &N, path: &str) -> Result<Option<N>> {
    if path.is_empty() {
        return Ok(Some(base.clone()));
    }

    let mut current = base.clone();
    for segment in path.split('.') {
        match current.get(segment)? {
            Some(next) if next.is_truthy() => current = next,
            _ => return Ok(None),
        }
    }
    Ok(Some(current))
}

use crate::error::Result;
use crate::graph::HostNode;
use crate::result::{CandidateContainer, TrajectoryRecord};
use crate::validator::is_valid_trajectory;
use serde_json::Value;
use tracing::{debug, warn};

pub const ITEM_TYPE_FIELD: &str = "item_type";
pub const TEXT_FIELD: &str = "text";
/// `item_type` tag of free-response entries, the only ones carrying payloads.
pub const FREE_RESPONSE_TAG: &str = "fr";

/// Pulls serialized trajectories out of candidate containers.
#[derive(Debug, Clone, Default)]
pub struct PayloadExtractor;

impl PayloadExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Return the first entry of `container` that parses and validates.
    ///
    /// Malformed entries are logged and skipped. Only host access failures
    /// are returned as errors.
    pub fn extract<N: HostNode>(
        &self,
        container: &CandidateContainer<N>,
    ) -> Result<Option<TrajectoryRecord>> {
        debug!("Inspecting container at {}", container.path);

        for key in container.node.keys()? {
            let Some(entry) = container.node.get(&key)? else {
                continue;
            };
            let Some(text) = Self::free_response_text(&entry)? else {
                continue;
            };

            let location = format!("{}.{}", container.path, key);
            match serde_json::from_str::<Value>(&text) {
                Ok(parsed) if is_valid_trajectory(&parsed) => {
                    debug!("Valid trajectory found at {}", location);
                    return Ok(Some(TrajectoryRecord::new(parsed, location)));
                }
                Ok(_) => {
                    debug!("Entry at {} parsed but is not a trajectory", location);
                }
                Err(e) => {
                    warn!("Failed to parse entry at {}: {}", location, e);
                }
            }
        }

        Ok(None)
    }

    fn free_response_text<N: HostNode>(entry: &N) -> Result<Option<String>> {
        let is_free_response = entry
            .get(ITEM_TYPE_FIELD)?
            .is_some_and(|tag| tag.as_str() == Some(FREE_RESPONSE_TAG));
        if !is_free_response {
            return Ok(None);
        }

        Ok(entry
            .get(TEXT_FIELD)?
            .and_then(|text| text.as_str().filter(|s| !s.is_empty()).map(str::to_string)))
    }
}

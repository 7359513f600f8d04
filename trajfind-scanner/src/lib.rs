pub mod error;
pub mod extractor;
pub mod graph;
pub mod result;
pub mod scanner;
pub mod validator;

pub use error::ScanError;
pub use extractor::PayloadExtractor;
pub use graph::{HostNode, HostObject, HostValue};
pub use result::{CandidateContainer, TrajectoryRecord};
pub use scanner::{GraphScanner, ProgressCallback, resolve_path};
pub use validator::is_valid_trajectory;

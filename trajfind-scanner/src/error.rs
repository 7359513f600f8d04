use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Host graph access failed: {0}")]
    HostAccess(String),

    #[error("Node limit exceeded: visited more than {0} nodes")]
    NodeLimitExceeded(usize),
}

pub type Result<T> = std::result::Result<T, ScanError>;

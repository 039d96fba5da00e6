use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("governance error: {0}")]
    Governance(#[from] kycdao_governance::GovernanceError),

    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

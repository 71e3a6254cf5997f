use thiserror::Error;

#[derive(Debug, Error)]
pub enum StakeboardError {
    #[error("Invalid account address: {0}")]
    InvalidAddress(String),

    #[error("Invalid config: {0}")]
    Config(String),
}

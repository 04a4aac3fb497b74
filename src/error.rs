use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("too few wrappers: {0}")]
    TooFewWrps(String),

    #[error("too many wrappers: {0}")]
    TooManyWrps(String),

    #[error("wrong input: {0}")]
    WrongInput(String),

    #[error("lumi mismatch: {0}")]
    NoLumiMatch(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("pool error: {0}")]
    Pool(String),

    #[error("tool error: {0}")]
    Tool(String),

    #[error("interrupted")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, Error>;

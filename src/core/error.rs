use crate::core::document::NodeId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0:?} is detached from the document")]
    Detached(NodeId),

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("node {0:?} is not a text node")]
    NotText(NodeId),

    #[error("node {0:?} cannot be placed inside itself")]
    Cycle(NodeId),

    #[error("node {0:?} is still attached")]
    Attached(NodeId),
}

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("failed to read wordbook: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed wordbook json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed wordbook cache: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("wordbook {0} not found")]
    UnknownBook(u64),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("vocabulary is empty")]
    EmptyVocabulary,

    #[error("failed to compile vocabulary pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("document is already borrowed")]
    DocumentBusy,

    #[error("engine state is already borrowed")]
    EngineBusy,

    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

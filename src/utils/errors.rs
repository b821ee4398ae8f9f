use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid catalog response body: {0}")]
    InvalidResponseBody(String),
    #[error("Unexpected catalog request error: {0}")]
    UnexpectedRequestError(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
    #[error("Write to `{0}` rejected by store access rules.")]
    PermissionDenied(String),
    #[error("Invalid store path: `{0}`")]
    InvalidPath(String),
    #[error("Could not encode value for `{0}`: {1}")]
    Serialization(String, String),
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Card instance `{0}` is not on the board.")]
    CardNotFound(uuid::Uuid),
}

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room `{0}` does not exist.")]
    RoomNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

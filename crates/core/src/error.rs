#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Post not found.")]
    PostNotFound,
    #[error("Post is not published.")]
    PostNotPublished,
    #[error("Public editing is not enabled for this post.")]
    EditingNotEnabled,
    #[error("Graffiti is not enabled for this post.")]
    GraffitiNotEnabled,
    #[error("{message}")]
    Validation {
        /// Stable machine-readable code surfaced to API clients.
        code: &'static str,
        message: String,
    },
    #[error("media storage failed: {0}")]
    Storage(#[from] mural_files::FilesError),
    #[error(
        "drawing submission failed and record cleanup also failed (record: {record_id}): \
         submit={submit_error}; cleanup={cleanup_error}"
    )]
    CleanupAfterSubmitFailed {
        record_id: u64,
        #[source]
        submit_error: Box<CoreError>,
        cleanup_error: std::io::Error,
    },
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete record: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialize record: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize record: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl CoreError {
    /// Builds a `Validation` error with a stable machine code and a
    /// human-readable message.
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        CoreError::Validation {
            code,
            message: message.into(),
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

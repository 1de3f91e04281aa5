use crate::constants::messages;
use crate::identity::AuthError;
use crate::intake::IntakeError;

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("no authenticated session")]
    NotAuthenticated,
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize document: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize document: {0}")]
    Deserialization(serde_json::Error),
    #[error("stored document is not a JSON object")]
    NotAnObject,
    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),

    #[error("identity provider error: {0}")]
    Auth(#[from] AuthError),
    #[error("intake request failed: {0}")]
    Intake(#[from] IntakeError),
}

pub type PortalResult<T> = std::result::Result<T, PortalError>;

impl PortalError {
    /// Text suitable for showing to the patient. Storage and serialization details are
    /// logged by the caller, not shown.
    pub fn user_message(&self) -> String {
        match self {
            PortalError::InvalidInput(message) => message.clone(),
            PortalError::NotAuthenticated => messages::NOT_AUTHENTICATED.to_string(),
            PortalError::Auth(err) => err.user_message(),
            PortalError::Intake(_) | PortalError::HttpClient(_) => {
                messages::CONNECTION_FAILED.to_string()
            }
            _ => messages::INTERNAL_ERROR.to_string(),
        }
    }
}

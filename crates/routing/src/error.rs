#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to navigate to {url}: {reason}")]
    Navigation { url: String, reason: String },
}

impl Error {
    pub fn navigation(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

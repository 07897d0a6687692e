use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("directory scan failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid report: {message}")]
    Report { message: String },

    #[error("attachment extraction failed: {message}")]
    Mail { message: String },

    #[error("report serialization failed: {message}")]
    Render { message: String },
}

impl From<toml::de::Error> for ConvertError {
    fn from(error: toml::de::Error) -> Self {
        ConvertError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

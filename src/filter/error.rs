use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),
}

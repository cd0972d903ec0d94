use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The {table} must contain a '{column}' column.")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("The following {table} columns are missing: {}", .columns.join(", "))]
    MissingColumns {
        table: &'static str,
        columns: Vec<&'static str>,
    },

    #[error("unknown text encoding '{0}'")]
    UnknownEncoding(String),

    #[error("customer data is not unique on '{key}': the join must be many-to-one")]
    NotManyToOne { key: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

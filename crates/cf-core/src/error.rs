use thiserror::Error;

pub type CfResult<T> = Result<T, CfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CfError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Not a number: {what} = {raw:?}")]
    NotANumber { what: &'static str, raw: String },
}

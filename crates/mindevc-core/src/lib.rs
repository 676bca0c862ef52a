use error::MindevcError;

pub mod error;
pub mod layout;
pub mod pipeline;

pub type MindevcResult<T> = std::result::Result<T, MindevcError>;

pub mod arch;
pub mod config;
pub mod error;
pub mod tools;

#[cfg(test)]
pub mod test_utils;

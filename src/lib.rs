//! tabhop library exports for testing

pub mod command;
pub mod core;
pub mod host;
pub mod runtime;

#[cfg(test)]
pub mod test_support;

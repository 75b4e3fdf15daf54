//! Zaptec charger usage reports: fetch, aggregate, render to xlsx, email

pub mod cli;
pub mod context;
pub mod observability;
pub mod services;
pub mod types;

#[cfg(test)]
mod test_support;

//! Pure helpers shared by the client and its callers.

pub mod info;
pub mod keys;

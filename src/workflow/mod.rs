//! Business rules: who may do what to which record.
//!
//! Every operation takes the acting [`User`](crate::types::User) and a
//! `&dyn Store`, so the HTTP layer only translates requests and errors.

pub mod access;
pub mod editor;
pub mod reports;
pub mod settings;
pub mod templates;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

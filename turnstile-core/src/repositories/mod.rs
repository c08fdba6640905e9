//! Repository traits for data access layer
//!
//! The login path reads user credentials through [`CredentialRepository`]. The
//! host application implements it over whatever store it already has; the
//! [`InMemoryCredentialRepository`] is provided for tests and small embeddings.

pub mod credential;
pub mod memory;

pub use credential::CredentialRepository;
pub use memory::InMemoryCredentialRepository;

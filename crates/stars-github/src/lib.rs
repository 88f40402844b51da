//! # stars-github
//!
//! GraphQL access to a user's starred repositories and curated lists:
//! - [`lists::ListWalker`]: every list with all of its items
//! - [`stars::StarWalker`]: starred repositories, one page at a time
//! - [`mutation`]: membership updates and repository id lookup
//!
//! All of it runs over the [`GraphQlTransport`] trait. [`GithubClient`] is
//! the HTTP implementation; the `test-support` feature adds an in-memory one.

mod error;
pub mod facts;
mod http;
pub mod lists;
pub mod mutation;
pub mod queries;
pub mod stars;
mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

pub use error::GithubError;
pub use lists::{ListWalker, RemoteList};
pub use stars::StarWalker;
pub use transport::{GithubClient, GraphQlTransport};

mod error;
mod repository;

pub use error::RepositoryError;
pub use repository::{Commit, Find, Get, Repository};

pub mod error;
pub mod repo;
pub mod repo_types;

pub use error::{LookupKey, UserRepoError};
pub use repo::UserRepository;
pub use repo_types::{User, UserList, UserWithPassword};

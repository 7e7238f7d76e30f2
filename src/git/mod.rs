mod repo;

pub use repo::Git;

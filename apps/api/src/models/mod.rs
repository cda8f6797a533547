pub mod career;
pub mod chat;
pub mod execution;
pub mod job;
pub mod profile;
pub mod resume;

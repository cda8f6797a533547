// Chat sessions: per-user CRUD over the `chatSessions` collection.

pub mod handlers;
pub mod validation;

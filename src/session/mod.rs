pub mod manager;

pub use manager::{Role, Session, SessionManager, Turn};

pub mod admin;
pub mod error;
pub mod groups;
pub mod invitations;
pub mod state;
pub mod sync;
pub mod users;

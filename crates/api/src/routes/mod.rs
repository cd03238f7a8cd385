pub mod admin;
pub mod events;
pub mod gallery;
pub mod health;
pub mod invitations;
pub mod lodging;
pub mod responses;

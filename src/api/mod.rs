//! API handlers for the Biblio REST endpoints

pub mod books;
pub mod health;
pub mod issues;
pub mod readers;

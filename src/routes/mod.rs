pub mod admin;
pub mod auth;
pub mod exams;
pub mod health;
pub mod questions;
pub mod subscriptions;
pub mod users;

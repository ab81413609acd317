pub mod answers;
pub mod languages;
pub mod questions;
pub mod users;
pub mod words;

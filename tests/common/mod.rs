#![allow(dead_code)]

pub mod app;
pub mod doubles;
pub mod fixtures;
pub mod http;

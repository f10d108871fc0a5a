pub mod auth;
pub mod languages;
pub mod pages;
pub mod quiz;
pub mod tables;

pub mod answer;
pub mod csv_import;
pub mod error;
pub mod leitner;
pub mod models;
pub mod password;
pub mod quiz;
pub mod validation;

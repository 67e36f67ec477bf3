pub mod credentials;
pub mod errors;
pub mod models;
pub mod providers;
pub mod requests;
pub mod responses;
pub mod sessions;
pub mod settings;

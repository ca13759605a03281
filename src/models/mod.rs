pub mod settings;
pub mod slot;
pub mod user;

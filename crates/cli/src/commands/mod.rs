pub mod chat;
pub mod doctor;
pub mod image;
pub mod init;
pub mod models;
pub mod search;
pub mod settings;

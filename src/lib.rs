pub mod card;
pub mod cli;
pub mod error;
pub mod feed;
pub mod github;
pub mod models;
pub mod server;
pub mod source;
pub mod theme;
pub mod types;
pub mod view;

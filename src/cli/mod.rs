pub mod edit;
pub mod list;
pub mod login;
pub mod rates;
pub mod settings;
pub mod setup;
pub mod ui;

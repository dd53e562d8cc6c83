pub mod api;
pub mod configure;
pub mod credentials;
pub mod dashboard;
pub mod history;
pub mod logger;
pub mod logging;
pub mod models;
pub mod transfer;
pub mod wizard;

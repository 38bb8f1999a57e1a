mod api;
mod error;
mod logger;

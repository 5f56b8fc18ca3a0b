pub mod address;
pub mod config;
pub mod geocode;
pub mod pipeline;
pub mod table;

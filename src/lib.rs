pub mod collector;
pub mod config;
pub mod judgeapi;
pub mod judgedb;
pub mod models;
pub mod reports;

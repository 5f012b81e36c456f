//! LumiCare backend: emergency alerting and real-time status
//! coordination for patients and their caretakers.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod emergency;
pub mod models;

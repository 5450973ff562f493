pub mod config;
pub mod error;
pub mod flow_analyzer;
pub mod global_variables;
pub mod monitoring;
pub mod shared_data;

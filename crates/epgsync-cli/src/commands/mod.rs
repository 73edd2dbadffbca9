pub mod clear;
pub mod config;
pub mod run;
pub mod run_ui;
pub mod status;

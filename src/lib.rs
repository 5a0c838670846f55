pub mod autosave;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod evaluate;
pub mod gateway;
pub mod integrity;
pub mod logging;
pub mod model;
pub mod navigator;
pub mod progress;
pub mod report;
pub mod state;
pub mod timer;
pub mod tui;
pub mod ui;

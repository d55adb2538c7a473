//! Directory browser that shows the non-recursive size of every folder, with
//! a live filter, per-folder refresh and an optional filesystem watcher.

pub mod app;
pub mod components;
pub mod config;
pub mod error;
pub mod event;
pub mod fs;
pub mod handler;
pub mod logging;
pub mod theme;
pub mod tui;
pub mod ui;

#![forbid(unsafe_code)]

pub mod api;
pub mod app;
pub mod catalog;
pub mod cli;
pub mod formats;
pub mod logging;
pub mod map;
pub mod markers;
pub mod navigator;
pub mod places;
pub mod plot;
pub mod render;
pub mod view;

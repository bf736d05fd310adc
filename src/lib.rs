//! Terminal map for drawing polygons and measuring their spherical area.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod map;
pub mod provider;
pub mod ui;
pub mod view;

//! Terminal presentation: views, prompts and interactive loops.

pub mod browse;
pub mod gallery;
pub mod terminal;
pub mod views;

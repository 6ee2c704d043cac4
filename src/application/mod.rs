//! Application services: console state, bootstrap flow and the remote seams.

pub mod bootstrap;
pub mod console;
pub mod credentials;
pub mod editor;
pub mod error;
pub mod pagination;
pub mod post_list;
pub mod prompt;
pub mod repos;
pub mod session;
pub mod uploads;
pub mod viewer;

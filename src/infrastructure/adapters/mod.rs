//! Front-end adapters

pub mod console;

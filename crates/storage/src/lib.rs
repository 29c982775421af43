#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod document;
pub mod memory;
pub mod records;
pub mod remote;
pub mod repository;

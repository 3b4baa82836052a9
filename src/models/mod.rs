//! Domain model module declarations.

pub mod action;
pub mod command;

#![cfg(test)]

pub mod common;
pub mod discovery_tests;
pub mod lifecycle_tests;
pub mod application_tests;

//! API route tables

pub mod records;

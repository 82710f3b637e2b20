//! Command implementations, one module per storefront area.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod orders;

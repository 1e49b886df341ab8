pub mod api;
pub mod assembler;
pub mod commits;
pub mod config;
pub mod pagination;
pub mod readme;
pub mod render;
pub mod repositories;

#[cfg(test)]
mod testing;

pub mod cli;
pub mod credential;
pub mod errors;
pub mod extract;
pub mod mapping;
pub mod pass;
pub mod resolver;

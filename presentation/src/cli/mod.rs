pub mod commands;
pub mod participants;

pub mod base;
pub mod telegram;

pub mod sentence;
pub mod settings;

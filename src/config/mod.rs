pub mod exchange;
pub mod loader;
pub mod settings;
pub mod styles;
pub mod validator;

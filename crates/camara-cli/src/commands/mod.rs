pub mod secret;
pub mod token;

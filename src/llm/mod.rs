pub mod factory;
pub mod openai_compatible;
pub mod provider;

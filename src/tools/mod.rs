pub mod args;
pub mod builtin;
pub mod definition;
pub mod dialer;
pub mod executor;

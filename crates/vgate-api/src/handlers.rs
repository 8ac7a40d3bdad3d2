//! Request handlers.

pub mod health;
pub mod pages;
pub mod uploads;

pub use health::*;
pub use pages::*;
pub use uploads::*;

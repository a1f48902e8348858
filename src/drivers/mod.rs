//! User-interface drivers: alarm indicator LED and push button.

pub mod button;
pub mod indicator;

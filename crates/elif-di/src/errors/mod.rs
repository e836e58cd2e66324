pub mod core;

pub use self::core::{InjectError, IllegalComponentReason};

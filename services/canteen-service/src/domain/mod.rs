pub mod billing;
pub mod item;

pub use billing::*;
pub use item::*;

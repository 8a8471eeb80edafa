pub mod pickup;
pub mod push;

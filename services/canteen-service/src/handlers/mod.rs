pub mod bills;
pub mod consumption;
pub mod items;

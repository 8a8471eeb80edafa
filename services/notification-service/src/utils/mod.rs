pub mod expo;

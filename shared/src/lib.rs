// Biblioteca compartilhada - Universo do Saber

pub mod models;
pub mod utils;

pub use models::claims::TokenClaims;

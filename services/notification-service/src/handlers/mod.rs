pub mod pickup;
pub mod push;
pub mod tokens;
pub mod websocket;

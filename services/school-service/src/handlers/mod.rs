pub mod classes;
pub mod links;
pub mod notices;
pub mod profile;
pub mod settings;
pub mod students;

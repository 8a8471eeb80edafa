pub mod link;
pub mod notice;
pub mod profile;
pub mod roster;
pub mod settings;

pub use link::*;
pub use notice::*;
pub use profile::*;
pub use roster::*;
pub use settings::*;

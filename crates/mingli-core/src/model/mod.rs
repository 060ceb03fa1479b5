pub mod analysis;
pub mod birth;
pub mod entries;
pub mod user;

pub use analysis::*;
pub use birth::*;
pub use entries::Entries;
pub use user::*;

#[cfg(test)]
mod tests;

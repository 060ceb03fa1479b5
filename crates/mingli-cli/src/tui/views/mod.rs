pub mod analysis;
pub mod form;
pub mod list;
pub mod welcome;

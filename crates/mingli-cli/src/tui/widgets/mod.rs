pub mod help_bar;
pub mod nav_bar;
pub mod tab_bar;
pub mod text_field;

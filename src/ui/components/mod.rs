pub mod capture_panel;
pub mod date_input;
pub mod popup;

mod log_view;
mod text_field;

pub use log_view::LogView;
pub use text_field::TextField;

pub mod html;
pub mod ip;

pub use html::escape_html;

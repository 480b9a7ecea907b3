pub mod image;
pub mod output;
pub mod text;

pub mod canvas;
pub mod config;
pub mod document;
pub mod font;
pub mod generator;
pub mod image;
pub mod page;
pub mod pdf_canvas;
pub mod source;
pub mod table;
pub mod types;
pub mod writer;

pub mod assembler;
pub mod image;
pub mod metadata;
pub mod optimizer;
pub mod reader;
pub mod stamp;
pub mod text;
pub mod writer;

pub mod document;
pub mod engine;

#[cfg(test)]
pub mod testing;

pub use document::PdfDocument;
pub use engine::{DocumentEngine, LopdfEngine};

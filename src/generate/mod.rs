pub mod assembler;
pub mod materializer;
pub mod naming;

pub use assembler::ListAssembler;
pub use materializer::VariantMaterializer;
pub use naming::NameDeriver;

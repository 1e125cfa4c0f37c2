pub mod extractor;
pub mod parser;
pub mod portal;

pub use extractor::IeExtractor;
pub use parser::ResultPageParser;
pub use portal::{PortalClient, PortalFactory, SefazPortal, SefazPortalFactory};

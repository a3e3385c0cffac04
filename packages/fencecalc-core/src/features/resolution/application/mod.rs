mod resolver;
mod writer;

pub use resolver::Resolver;
pub use writer::ConfigWriter;

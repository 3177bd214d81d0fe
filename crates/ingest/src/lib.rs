pub mod extractor;
pub mod pipeline;
pub mod signal_file;

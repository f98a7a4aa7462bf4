pub mod model;
pub mod ops;

pub use model::{load_raw_bin, parse_number, Image};
pub use ops::{check, load_plan, render_all, sample_words, write_artifacts, ListingLine};

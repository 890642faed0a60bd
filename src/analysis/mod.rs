pub mod classifier;
pub mod file_type;
pub mod line_count;
pub mod score;
pub mod weights;

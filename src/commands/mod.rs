pub mod db;
pub mod metric;
pub mod settings;

pub mod action;
pub mod commit;
pub mod score;
pub mod version;

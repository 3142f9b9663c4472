pub mod construction;
pub mod stabilized;

pub mod carrying;
pub mod development;

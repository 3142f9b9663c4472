pub mod exit;
pub mod waterfall;

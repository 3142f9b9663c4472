pub mod financing;
pub mod proforma;
pub mod returns;
pub mod revenue;

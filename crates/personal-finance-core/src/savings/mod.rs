pub mod compound;
pub mod recurring;

pub mod comparison;
pub mod loans;
pub mod savings;

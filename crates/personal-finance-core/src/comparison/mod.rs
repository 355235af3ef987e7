#[cfg(feature = "tax_harvesting")]
pub mod tax_harvesting;

#[cfg(feature = "rent_vs_buy")]
pub mod rent_vs_buy;

#[cfg(feature = "portfolio")]
pub mod portfolio;

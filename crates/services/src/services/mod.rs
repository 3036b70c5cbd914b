pub mod achievements;
pub mod balance;
pub mod path_integrity;
pub mod progression;

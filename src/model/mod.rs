pub mod apperror;
pub mod config;
pub mod fees;
pub mod listing;
pub mod members;
pub mod meetings;
pub mod packages;
pub mod powerteams;
pub mod referrals;
pub mod session;
pub mod status;
pub mod taxonomy;
pub mod validation;

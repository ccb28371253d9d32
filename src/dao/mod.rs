pub mod crud;
pub mod meetings;
pub mod members;
pub mod packages;
pub mod powerteams;
pub mod referrals;
pub mod taxonomy;

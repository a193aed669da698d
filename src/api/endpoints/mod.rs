pub mod conditions;
pub mod diagnose;
pub mod health;

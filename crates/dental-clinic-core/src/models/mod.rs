//! Domain models for the dental clinic.

mod appointment;
mod doctor;
mod inventory;
mod invoice;
mod odontogram;
mod patient;
mod treatment;
mod validation;

pub use appointment::*;
pub use doctor::*;
pub use inventory::*;
pub use invoice::*;
pub use odontogram::*;
pub use patient::*;
pub use treatment::*;
pub use validation::ValidationError;
pub(crate) use validation::round_currency;

mod driver;
mod simulated;

pub mod registers;

pub use driver::RadSens;
pub use registers::{CHIP_ID, DEFAULT_ADDRESS};
pub use simulated::{SimulatedBus, SimulatedBusError, DEFAULT_SENSITIVITY};

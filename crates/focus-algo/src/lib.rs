mod alert;
mod ear;
mod features;
mod idle;
mod landmark;
mod presence;
mod scoring;
pub mod synthetic;

pub use alert::*;
pub use ear::*;
pub use features::*;
pub use idle::*;
pub use landmark::*;
pub use presence::*;
pub use scoring::*;

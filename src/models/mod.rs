pub mod catalog;
pub mod drug;
pub mod enrollment;
pub mod enums;

pub use catalog::*;
pub use drug::*;
pub use enrollment::*;
pub use enums::*;

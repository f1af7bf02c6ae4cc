mod check;
mod generate;
mod inspect;
mod watch;

pub use check::*;
pub use generate::*;
pub use inspect::*;
pub use watch::*;

mod deadline;

pub use deadline::*;

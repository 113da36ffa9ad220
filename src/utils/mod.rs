pub mod deadline;
pub mod keys;

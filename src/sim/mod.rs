mod ticker;

pub use ticker::Simulator;

mod rows;

pub use rows::MemoryRows;

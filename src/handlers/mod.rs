pub mod error;
pub mod evaluate;
pub mod whatif;

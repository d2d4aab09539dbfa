pub mod dividends;
pub mod evaluate;
pub mod export;
pub mod scenario;
pub mod yahoo;

pub mod block;
pub mod erc20;
pub mod error;
pub mod series;
pub mod units;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

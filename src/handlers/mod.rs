//! 핸들러 모듈

pub mod connection;
pub mod relay;

pub use connection::*;
pub use relay::*;

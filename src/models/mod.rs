pub mod channel;
pub mod feed;
pub mod posted;

pub mod application;
pub mod earning;
pub mod lesson;
pub mod money;
pub mod notification;
pub mod payout;
pub mod ports;
pub mod teacher;
pub mod tier;

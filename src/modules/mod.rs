pub mod pipeline;
pub mod records;
pub mod removebg;
pub mod storage;
pub mod uploads;
pub mod webhook;

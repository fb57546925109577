pub mod aggregate;
pub mod collector;
pub mod cycle;
pub mod load;
pub mod reading;
pub mod report;
pub mod sample;
pub mod sign;
pub mod source;

pub mod fronius;
pub mod pvoutput;

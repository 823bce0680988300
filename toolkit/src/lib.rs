pub mod from_str_ex;
pub mod running_mean;

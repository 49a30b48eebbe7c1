pub mod test_utils;
pub mod time_format;

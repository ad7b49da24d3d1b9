pub mod alarm;
pub mod appsettings;
pub mod gateway;
pub mod scheduling;
pub mod storage;

#[cfg(test)]
mod test_utils;

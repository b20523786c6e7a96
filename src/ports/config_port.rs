//! Configuration access port trait.
//!
//! Typed getters return `Ok(None)` for a missing key and `ConfigInvalid` for a
//! key that is present but does not parse.

use crate::domain::error::SteptraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, SteptraderError>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, SteptraderError>;
}

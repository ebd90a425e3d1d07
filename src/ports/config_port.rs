//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `Ok(None)` when the key is absent, `Err` when present but not an integer.
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String>;

    /// Accepts true/false, yes/no and 1/0 in any case.
    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String>;

    /// Key/value pairs of a section in file order; empty if the section is absent.
    fn entries(&self, section: &str) -> Vec<(String, String)>;
}

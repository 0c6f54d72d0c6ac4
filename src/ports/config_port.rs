//! Configuration access port trait.

/// Read-only access to `[section] key = value` settings.
///
/// Typed getters fall back to `default` when the key is absent or does not
/// parse.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    fn has_key(&self, section: &str, key: &str) -> bool {
        self.get_string(section, key).is_some()
    }
}

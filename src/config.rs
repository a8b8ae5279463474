//! Pass configuration shared across transforms

use once_cell::sync::Lazy;

/// Fully-qualified names of sink methods whose arguments must never carry
/// sensitive data.
static DEFAULT_DANGEROUS_METHODS: Lazy<Vec<String>> =
    Lazy::new(|| vec!["java.io.PrintStream.write".to_string()]);

/// Configuration for the analysis passes
#[derive(Debug, Clone)]
pub struct Config {
    /// Fully-qualified method names (`declaring.class.name`) treated as
    /// dangerous sinks by the taint annotator
    pub dangerous_methods: Vec<String>,
}

impl Config {
    pub fn new(dangerous_methods: Vec<String>) -> Self {
        Self { dangerous_methods }
    }

    /// Check whether a fully-qualified method name is a configured sink
    pub fn is_dangerous(&self, full_name: &str) -> bool {
        self.dangerous_methods.iter().any(|m| m == full_name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { dangerous_methods: DEFAULT_DANGEROUS_METHODS.clone() }
    }
}

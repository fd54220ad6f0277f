use std::fmt;
use zeroize::Zeroizing;

/// The low-entropy application secret that all keys are derived from.
///
/// Zeroized on drop and redacted from `Debug` output.
#[derive(Clone)]
pub struct AppSecret(Zeroizing<String>);

impl AppSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for AppSecret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AppSecret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for AppSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AppSecret(..)")
    }
}

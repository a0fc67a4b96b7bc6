//! Login handling
//!
//! A login request carries a password. The [`Authenticator`] decides
//! whether it is accepted and, if so, raises the unit's access tier with
//! [`UnitConfig::set_auth_level`].

use crate::config::{AuthLevel, UnitConfig};

/// Checks a login password
pub trait Authenticator {
    /// Returns true if `password` is accepted
    ///
    /// Implementations set the new access tier on `unit` themselves.
    fn login(&mut self, password: &[u8], unit: &mut UnitConfig) -> bool;
}

/// Accepts every login and opens the unit
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAccess;

impl Authenticator for OpenAccess {
    fn login(&mut self, _password: &[u8], unit: &mut UnitConfig) -> bool {
        unit.set_auth_level(AuthLevel::Open);
        true
    }
}

/// Fixed password
#[derive(Debug, Clone, Copy)]
pub struct PasswordAuth {
    password: &'static [u8],
    granted: AuthLevel,
}

impl PasswordAuth {
    /// Grant [`AuthLevel::Open`] for `password`
    pub const fn new(password: &'static [u8]) -> Self {
        Self {
            password,
            granted: AuthLevel::Open,
        }
    }

    /// Grant `level` instead of [`AuthLevel::Open`]
    pub const fn granting(mut self, level: AuthLevel) -> Self {
        self.granted = level;
        self
    }
}

impl Authenticator for PasswordAuth {
    fn login(&mut self, password: &[u8], unit: &mut UnitConfig) -> bool {
        let accepted = password == self.password;
        if accepted {
            unit.set_auth_level(self.granted);
        }
        accepted
    }
}

impl<F> Authenticator for F
where
    F: FnMut(&[u8], &mut UnitConfig) -> bool,
{
    fn login(&mut self, password: &[u8], unit: &mut UnitConfig) -> bool {
        self(password, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_auth() {
        let mut unit = UnitConfig::default();
        unit.set_auth_level(AuthLevel::Locked);
        let mut auth = PasswordAuth::new(b"1234").granting(AuthLevel::ReadOnly);

        assert!(!auth.login(b"123", &mut unit));
        assert_eq!(unit.auth_level(), AuthLevel::Locked);

        assert!(auth.login(b"1234", &mut unit));
        assert_eq!(unit.auth_level(), AuthLevel::ReadOnly);
    }

    #[test]
    fn test_closure_auth() {
        let mut attempts = 0;
        let mut auth = |password: &[u8], unit: &mut UnitConfig| {
            attempts += 1;
            if password.starts_with(b"ok") {
                unit.set_auth_level(AuthLevel::Open);
                true
            } else {
                false
            }
        };
        let mut unit = UnitConfig::default();
        unit.set_auth_level(AuthLevel::Locked);

        assert!(auth.login(b"okay", &mut unit));
        assert!(!auth.login(b"no", &mut unit));
        assert_eq!(unit.auth_level(), AuthLevel::Open);
        assert_eq!(attempts, 2);
    }
}

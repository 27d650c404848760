use core_config::{ConfigError, FromEnv, env_parse, env_required};

const MIN_SECRET_LEN: usize = 32;
const DEFAULT_ACCESS_TTL_SECS: i64 = 900;

/// JWT verification settings.
///
/// - `JWT_SECRET` (required, at least 32 characters)
/// - `JWT_ACCESS_TTL_SECS` (default 900)
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_secs: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        check_secret(&secret)?;
        Ok(Self {
            secret,
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
        })
    }

    pub fn with_access_ttl(mut self, secs: i64) -> Self {
        self.access_ttl_secs = secs;
        self
    }
}

fn check_secret(secret: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigError::Invalid {
            key: "JWT_SECRET".to_string(),
            reason: format!(
                "must be at least {MIN_SECRET_LEN} characters (got {})",
                secret.len()
            ),
        });
    }
    Ok(())
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;
        check_secret(&secret)?;
        let access_ttl_secs = env_parse("JWT_ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)?;
        Ok(Self {
            secret,
            access_ttl_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "this-is-a-valid-secret-with-32-chars!";

    #[test]
    fn new_accepts_long_secret() {
        let config = JwtConfig::new(SECRET).unwrap();
        assert_eq!(config.secret, SECRET);
        assert_eq!(config.access_ttl_secs, 900);
    }

    #[test]
    fn new_rejects_short_secret() {
        let err = JwtConfig::new("short").unwrap_err();
        assert!(err.to_string().contains("32 characters"));
    }

    #[test]
    fn from_env_reads_secret_and_ttl() {
        temp_env::with_vars(
            [("JWT_SECRET", Some(SECRET)), ("JWT_ACCESS_TTL_SECS", Some("60"))],
            || {
                let config = JwtConfig::from_env().unwrap();
                assert_eq!(config.secret, SECRET);
                assert_eq!(config.access_ttl_secs, 60);
            },
        );
    }

    #[test]
    fn from_env_requires_secret() {
        temp_env::with_var_unset("JWT_SECRET", || {
            let err = JwtConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("JWT_SECRET"));
        });
    }

    #[test]
    fn from_env_rejects_short_secret() {
        temp_env::with_var("JWT_SECRET", Some("short"), || {
            assert!(JwtConfig::from_env().is_err());
        });
    }
}

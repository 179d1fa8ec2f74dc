use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

/// Role assignment as supplied by the identity layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleGrant {
    pub id: String,
    pub permissions: Vec<String>,
}

/// Per-request snapshot of an actor's grants, pushed by the identity layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGrants {
    pub user_id: Uuid,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

/// Permission codes are dot-separated lowercase tokens, e.g. `stok.urun.ekle`.
pub fn validate_permission_code(code: &str) -> Result<(), ModelError> {
    let valid = !code.is_empty()
        && code.split('.').all(|seg| {
            !seg.is_empty()
                && seg
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        });
    if valid {
        Ok(())
    } else {
        Err(ModelError::Validation(format!("invalid permission code: {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_code_format() {
        assert!(validate_permission_code("stok.urun.ekle").is_ok());
        assert!(validate_permission_code("module.crm.access").is_ok());
        assert!(validate_permission_code("").is_err());
        assert!(validate_permission_code("Stok.Urun").is_err());
        assert!(validate_permission_code("a..b").is_err());
    }
}

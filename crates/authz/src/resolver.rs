use crate::error::Result;
use qms_database::{
    Database, DatabaseError, OverrideRepository, PermissionRepository, RoleRepository,
    UserRepository,
};
use qms_models::{OverrideDetail, Permission};
use std::collections::{BTreeMap, HashSet};

/// Computes effective permission sets and answers point queries.
///
/// Overrides are stronger than role membership in both directions: an
/// `is_granted = true` row grants a code the role lacks, an
/// `is_granted = false` row revokes a code the role has. There is no cache;
/// every check reads current role and override state.
pub struct PermissionResolver {
    users: UserRepository,
    roles: RoleRepository,
    permissions: PermissionRepository,
    overrides: OverrideRepository,
}

impl PermissionResolver {
    pub fn new(db: &Database) -> Self {
        Self {
            users: UserRepository::new(db.pool().clone()),
            roles: RoleRepository::new(db.pool().clone()),
            permissions: PermissionRepository::new(db.pool().clone()),
            overrides: OverrideRepository::new(db.pool().clone()),
        }
    }

    /// Effective permission codes for a user.
    ///
    /// A missing user, or one with no role and no overrides, yields an empty
    /// set rather than an error; having no permission is a normal outcome.
    pub async fn effective_permission_codes(&self, user_id: i64) -> Result<HashSet<String>> {
        let user = match self.users.find_by_id(user_id).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => return Ok(HashSet::new()),
            Err(e) => return Err(e.into()),
        };

        let role_codes = match user.role_id {
            Some(role_id) => self.roles.permission_codes(role_id).await?,
            None => Vec::new(),
        };
        let overrides = self.overrides.list_by_user(user_id).await?;

        Ok(merge_effective_codes(role_codes, &overrides))
    }

    /// Point permission check, override-first.
    ///
    /// An existing override is authoritative for its code and role membership
    /// is not consulted. Ambiguity never grants: a missing user or role
    /// resolves to `false`.
    pub async fn has_permission(&self, user_id: i64, code: &str) -> Result<bool> {
        if let Some(decision) = self.overrides.decision_for_code(user_id, code).await? {
            return Ok(decision);
        }

        let user = match self.users.find_by_id(user_id).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        match user.role_id {
            Some(role_id) => Ok(self.roles.contains_code(role_id, code).await?),
            None => Ok(false),
        }
    }

    /// Force-grant a permission regardless of role membership.
    ///
    /// Idempotent: re-granting an already-granted permission writes nothing.
    pub async fn grant_override(&self, user_id: i64, permission_id: i64) -> Result<()> {
        self.set_override(user_id, permission_id, true).await
    }

    /// Force-revoke a permission regardless of role membership.
    ///
    /// Idempotent: re-revoking an already-revoked permission writes nothing.
    pub async fn revoke_override(&self, user_id: i64, permission_id: i64) -> Result<()> {
        self.set_override(user_id, permission_id, false).await
    }

    async fn set_override(&self, user_id: i64, permission_id: i64, is_granted: bool) -> Result<()> {
        // Both referents must exist; repository misses surface as NotFound.
        self.users.find_by_id(user_id).await?;
        self.permissions.find_by_id(permission_id).await?;

        let written = self.overrides.set(user_id, permission_id, is_granted).await?;
        tracing::debug!(user_id, permission_id, is_granted, written, "set permission override");

        Ok(())
    }

    /// Remove an override, reverting the user to role-derived permissions for
    /// that code. A no-op when no override exists.
    pub async fn remove_override(&self, user_id: i64, permission_id: i64) -> Result<()> {
        let removed = self.overrides.remove(user_id, permission_id).await?;
        tracing::debug!(user_id, permission_id, removed, "remove permission override");

        Ok(())
    }

    /// All override rows for a user, joined with permission metadata
    pub async fn list_overrides(&self, user_id: i64) -> Result<Vec<OverrideDetail>> {
        Ok(self.overrides.list_by_user(user_id).await?)
    }

    /// The whole permission catalog
    pub async fn list_all(&self) -> Result<Vec<Permission>> {
        Ok(self.permissions.list_all().await?)
    }

    /// Catalog grouped by module, for administration screens
    pub async fn list_grouped_by_module(&self) -> Result<BTreeMap<String, Vec<Permission>>> {
        let mut grouped: BTreeMap<String, Vec<Permission>> = BTreeMap::new();
        for permission in self.permissions.list_all().await? {
            grouped
                .entry(permission.module.clone())
                .or_default()
                .push(permission);
        }

        Ok(grouped)
    }
}

/// Merge role-derived codes with override rows into the effective set.
///
/// Overrides win for their code: granted ones are added, revoked ones removed.
pub fn merge_effective_codes(
    role_codes: Vec<String>,
    overrides: &[OverrideDetail],
) -> HashSet<String> {
    let mut effective: HashSet<String> = role_codes.into_iter().collect();

    for row in overrides {
        if row.is_granted {
            effective.insert(row.code.clone());
        } else {
            effective.remove(&row.code);
        }
    }

    effective
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn override_row(code: &str, is_granted: bool) -> OverrideDetail {
        OverrideDetail {
            user_id: 1,
            permission_id: 1,
            is_granted,
            code: code.to_string(),
            name: code.to_string(),
            module: code.split('.').next().unwrap().to_string(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn no_role_no_overrides_is_empty() {
        assert!(merge_effective_codes(Vec::new(), &[]).is_empty());
    }

    #[test]
    fn role_codes_pass_through() {
        let effective = merge_effective_codes(
            vec!["proc.view".to_string(), "proc.create".to_string()],
            &[],
        );
        assert_eq!(effective.len(), 2);
        assert!(effective.contains("proc.view"));
        assert!(effective.contains("proc.create"));
    }

    #[test]
    fn revoke_beats_role_and_grant_extends_it() {
        // role has {A, B}, overrides revoke B and grant C => {A, C}
        let effective = merge_effective_codes(
            vec!["proc.view".to_string(), "proc.edit".to_string()],
            &[
                override_row("proc.edit", false),
                override_row("report.view", true),
            ],
        );

        let expected: HashSet<String> = ["proc.view", "report.view"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(effective, expected);
    }

    #[test]
    fn revoking_a_code_the_role_lacks_is_harmless() {
        let effective = merge_effective_codes(
            vec!["proc.view".to_string()],
            &[override_row("report.export", false)],
        );
        assert_eq!(effective, HashSet::from(["proc.view".to_string()]));
    }

    #[test]
    fn granting_a_code_the_role_already_has_keeps_one_entry() {
        let effective = merge_effective_codes(
            vec!["proc.view".to_string()],
            &[override_row("proc.view", true)],
        );
        assert_eq!(effective.len(), 1);
    }
}

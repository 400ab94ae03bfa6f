//! Admin capability check
//!
//! The identity provider decides who is an admin; services only ask.

use async_trait::async_trait;
use std::collections::HashSet;

#[async_trait]
pub trait AdminGate: Send + Sync {
    async fn is_admin(&self, user_id: &str) -> bool;
}

/// Grants admin rights to a fixed set of user ids.
#[derive(Clone, Debug, Default)]
pub struct AllowListAdminGate {
    admins: HashSet<String>,
}

impl AllowListAdminGate {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { admins: admins.into_iter().map(Into::into).collect() }
    }
}

#[async_trait]
impl AdminGate for AllowListAdminGate {
    async fn is_admin(&self, user_id: &str) -> bool {
        self.admins.contains(user_id)
    }
}

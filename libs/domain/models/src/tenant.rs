// [libs/domain/models/src/tenant.rs]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenantStatus {
    Active,
    Suspended,
    Closed,
}

/// Binding the dispatcher resolves endpoint + credentials from,
/// backing the `tenants` collection and tenant registry lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub tenant_id: String,
    pub status: TenantStatus,
    pub endpoint_url: String,
    pub dispatch_token: String,
    pub env: String,
}

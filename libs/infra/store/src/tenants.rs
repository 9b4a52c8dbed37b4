// [libs/infra/store/src/tenants.rs]
use dashmap::DashMap;
use myndlens_domain_models::Tenant;

/// `tenants` registry the dispatcher resolves endpoint + credentials
/// from.
#[derive(Default)]
pub struct TenantStore {
    by_id: DashMap<String, Tenant>,
}

impl TenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, tenant: Tenant) {
        self.by_id.insert(tenant.tenant_id.clone(), tenant);
    }

    pub fn get(&self, tenant_id: &str) -> Option<Tenant> {
        self.by_id.get(tenant_id).map(|e| e.clone())
    }
}

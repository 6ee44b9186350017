use std::collections::HashMap;

/// Owner/user directory collaborator: resolves the contact address the email
/// channel delivers to. Backed by the product's user service in deployment.
#[async_trait::async_trait]
pub trait OwnerDirectory: Send + Sync {
    async fn email_address(&self, owner_id: &str) -> Option<String>;
}

/// Fixed address book, used in tests and single-tenant deployments where the
/// mapping comes from configuration.
#[derive(Default)]
pub struct StaticDirectory {
    addresses: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, owner_id: &str, address: &str) -> Self {
        self.addresses
            .insert(owner_id.to_string(), address.to_string());
        self
    }

    /// Parses `owner=address,owner=address` pairs, the shape the service
    /// accepts from its environment.
    pub fn from_spec(spec: &str) -> Self {
        let mut directory = Self::new();
        for pair in spec.split(',') {
            if let Some((owner, address)) = pair.split_once('=') {
                let owner = owner.trim();
                let address = address.trim();
                if !owner.is_empty() && address.contains('@') {
                    directory
                        .addresses
                        .insert(owner.to_string(), address.to_string());
                }
            }
        }
        directory
    }
}

#[async_trait::async_trait]
impl OwnerDirectory for StaticDirectory {
    async fn email_address(&self, owner_id: &str) -> Option<String> {
        self.addresses.get(owner_id).cloned()
    }
}

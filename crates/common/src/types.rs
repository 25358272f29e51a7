use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub instance_id: Uuid,
}

impl ServiceInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            instance_id: Uuid::new_v4(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_info_carries_name_and_version() {
        let info = ServiceInfo::new("qlens-api");
        assert_eq!(info.name, "qlens-api");
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn instance_ids_differ() {
        assert_ne!(
            ServiceInfo::new("a").instance_id,
            ServiceInfo::new("a").instance_id
        );
    }
}

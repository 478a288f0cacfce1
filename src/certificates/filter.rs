use crate::core::types::{Certificate, KeyType};

/// Certificates of `collection` whose key type equals `key_type`, in source order.
pub fn filter_by_type(collection: &[Certificate], key_type: &KeyType) -> Vec<Certificate> {
    collection
        .iter()
        .filter(|cert| &cert.key_type == key_type)
        .cloned()
        .collect()
}

/// Names already taken for `key_type`, used to reject duplicate uploads.
pub fn names_for_type(collection: &[Certificate], key_type: &KeyType) -> Vec<String> {
    collection
        .iter()
        .filter(|cert| &cert.key_type == key_type)
        .map(|cert| cert.name.clone())
        .collect()
}

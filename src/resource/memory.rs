use std::collections::BTreeMap;

use super::{ResourceDataSet, ResourceId, ResourceManager, fnv_hash};

/// In-memory resource store keyed by [`fnv_hash`] of the name
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    entries: BTreeMap<ResourceId, Vec<u8>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` under the hash of `name`, returning the id
    pub fn insert(&mut self, name: &str, data: Vec<u8>) -> ResourceId {
        let id = fnv_hash(name);
        self.entries.insert(id, data);
        id
    }

    pub fn ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.entries.keys().copied()
    }
}

impl ResourceManager for MemoryResources {
    fn get(&self, id: ResourceId) -> Option<&[u8]> {
        self.entries.get(&id).map(Vec::as_slice)
    }
}

/// Entries in id order
impl ResourceDataSet for MemoryResources {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn data(&self, index: usize) -> Option<&[u8]> {
        self.entries.values().nth(index).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceError;

    fn store() -> (MemoryResources, Vec<ResourceId>) {
        let mut res = MemoryResources::new();
        let mut ids: Vec<_> = ["one", "two", "three"]
            .iter()
            .map(|name| res.insert(name, name.as_bytes().to_vec()))
            .collect();
        ids.sort_unstable();
        (res, ids)
    }

    #[test]
    fn test_get_by_name_hash() {
        let (res, _) = store();
        assert_eq!(res.get(fnv_hash("two")), Some(&b"two"[..]));
        assert_eq!(res.get(fnv_hash("four")), None);
    }

    #[test]
    fn test_get_batch() {
        let (res, ids) = store();
        let blobs = res.get_batch(&ids).unwrap();
        assert_eq!(blobs.len(), 3);
        for (id, blob) in ids.iter().zip(&blobs) {
            assert_eq!(res.get(*id), Some(*blob));
        }
    }

    #[test]
    fn test_get_batch_failures() {
        let (res, ids) = store();
        let reversed: Vec<_> = ids.iter().rev().copied().collect();
        assert_eq!(res.get_batch(&reversed), Err(ResourceError::Unsorted(1)));

        let missing = fnv_hash("four");
        let mut with_missing = ids.clone();
        with_missing.push(missing);
        with_missing.sort_unstable();
        assert_eq!(
            res.get_batch(&with_missing),
            Err(ResourceError::NotFound(missing))
        );
    }

    #[test]
    fn test_data_set_in_id_order() {
        let (res, ids) = store();
        assert_eq!(ResourceDataSet::len(&res), 3);
        assert_eq!(res.data(0), res.get(ids[0]));
        assert_eq!(res.data(3), None);
    }
}

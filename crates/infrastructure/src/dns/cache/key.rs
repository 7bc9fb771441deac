use hickory_proto::op::Query;
use hickory_proto::rr::{Name, RecordType};

/// Cache key: lowercased query name plus record type. Class is implicitly
/// IN. The same name with different record types (A vs. SRV) yields
/// distinct entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: Name,
    pub record_type: RecordType,
}

impl CacheKey {
    #[inline]
    pub fn new(name: Name, record_type: RecordType) -> Self {
        Self {
            name: name.to_lowercase(),
            record_type,
        }
    }
}

impl From<&Query> for CacheKey {
    fn from(query: &Query) -> Self {
        Self::new(query.name().clone(), query.query_type())
    }
}

use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Stable marker identifier.
///
/// Assigned once at ingestion (e.g. `tx-thc-12345`) and used as the
/// deduplication key by the store, the viewport filter and the proximity
/// record.
///
/// 标记的稳定标识符，在导入时分配，之后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(String);

impl_id!(MarkerId);

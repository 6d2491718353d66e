//! Request-scoped staging area for change records.
//!
//! Records are staged while a request runs and only reach a [`ChangeStore`]
//! when the request commits. An aborted request clears its journal.
//!
//! [`ChangeStore`]: crate::storage::ChangeStore

use crate::record::ChangeRecord;
use rackline_core::{EntityType, RequestId};

#[derive(Debug, Default)]
pub struct ChangeJournal {
    records: Vec<ChangeRecord>,
}

impl ChangeJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, record: ChangeRecord) {
        self.records.push(record);
    }

    /// Replace `postchange_data` on every staged record of the given object
    /// in the given request. Returns the number of records touched.
    pub fn coalesce_postchange(
        &mut self,
        entity_type: &EntityType,
        entity_id: u64,
        request_id: RequestId,
        postchange: Option<serde_json::Value>,
    ) -> usize {
        let mut touched = 0;
        for record in self
            .records
            .iter_mut()
            .filter(|r| r.is_same_object(entity_type, entity_id, request_id))
        {
            record.postchange_data = postchange.clone();
            touched += 1;
        }
        touched
    }

    /// Most recently staged record of the given object in the given request.
    pub fn latest_for(
        &self,
        entity_type: &EntityType,
        entity_id: u64,
        request_id: RequestId,
    ) -> Option<&ChangeRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.is_same_object(entity_type, entity_id, request_id))
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Discard all staged records. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.records.len();
        self.records.clear();
        n
    }

    /// Take all staged records, leaving the journal empty.
    pub fn take(&mut self) -> Vec<ChangeRecord> {
        std::mem::take(&mut self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackline_core::ObjectChangeAction;
    use serde_json::json;

    #[test]
    fn test_coalesce_only_touches_matching_records() {
        let request = RequestId::new();
        let site = EntityType::new("dcim", "site");
        let mut journal = ChangeJournal::new();

        journal.stage(
            ChangeRecord::builder(ObjectChangeAction::Create, site.clone(), 1)
                .request_id(request)
                .postchange(Some(json!({ "tags": [] })))
                .build(),
        );
        journal.stage(
            ChangeRecord::builder(ObjectChangeAction::Create, site.clone(), 2)
                .request_id(request)
                .postchange(Some(json!({ "tags": [] })))
                .build(),
        );

        let touched =
            journal.coalesce_postchange(&site, 1, request, Some(json!({ "tags": ["core"] })));
        assert_eq!(touched, 1);
        assert_eq!(journal.records()[0].postchange_data, Some(json!({ "tags": ["core"] })));
        assert_eq!(journal.records()[1].postchange_data, Some(json!({ "tags": [] })));

        assert_eq!(journal.coalesce_postchange(&site, 3, request, None), 0);
    }

    #[test]
    fn test_clear_and_take() {
        let mut journal = ChangeJournal::new();
        let site = EntityType::new("dcim", "site");
        journal.stage(ChangeRecord::builder(ObjectChangeAction::Create, site.clone(), 1).build());
        journal.stage(ChangeRecord::builder(ObjectChangeAction::Delete, site, 1).build());

        assert_eq!(journal.take().len(), 2);
        assert!(journal.is_empty());
        assert_eq!(journal.clear(), 0);
    }
}

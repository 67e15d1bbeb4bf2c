//! Actual-LRP group reader.
//!
//! Reads the `/v1/actual/<process-guid>/<index>/{instance,evacuating}` tree
//! and merges the records of each slot into an [`ActualLRPGroup`]. Bulk scans
//! parse one process subtree per unit of work on the [`WorkPool`].

use std::sync::Arc;

use tracing::{debug, error, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    actual_lrp_index_dir, actual_lrp_process_dir, ActualLRP, ActualLRPFilter, ActualLRPGroup,
    TreeNode, ACTUAL_LRP_EVACUATING_KEY, ACTUAL_LRP_INSTANCE_KEY, ACTUAL_LRP_SCHEMA_ROOT,
};
use crate::domain::ports::TreeStore;
use crate::services::work_pool::WorkPool;

pub struct ActualLrpReader<S: TreeStore> {
    store: Arc<S>,
    pool: WorkPool,
}

impl<S: TreeStore> ActualLrpReader<S> {
    pub fn new(store: Arc<S>, pool: WorkPool) -> Self {
        Self { store, pool }
    }

    /// Every group in the namespace that passes `filter`.
    ///
    /// Fails as a whole on the first malformed record. A store that cannot be
    /// read yields no groups.
    #[instrument(skip(self, filter), fields(domain = %filter.domain, cell_id = %filter.cell_id))]
    pub async fn all_groups(&self, filter: &ActualLRPFilter) -> DomainResult<Vec<ActualLRPGroup>> {
        let root = match self.store.fetch_subtree(ACTUAL_LRP_SCHEMA_ROOT).await {
            Ok(Some(root)) => root,
            Ok(None) => return Ok(Vec::new()),
            Err(err) => {
                error!(error = %err, "failed-fetching-actual-lrps");
                return Ok(Vec::new());
            }
        };

        let mut groups = if root.nodes.len() <= 1 {
            let mut groups = Vec::new();
            for process in &root.nodes {
                groups.extend(parse_process_subtree(process, filter)?);
            }
            groups
        } else {
            let works: Vec<_> = root
                .nodes
                .into_iter()
                .map(|process| {
                    let filter = filter.clone();
                    move || parse_process_subtree(&process, &filter)
                })
                .collect();

            debug!(units = works.len(), "performing deserialization work");
            let parsed = self.pool.run(works).await.map_err(|err| {
                error!(error = %err, "failed performing deserialization work");
                err
            })?;
            parsed.into_iter().flatten().collect()
        };

        sort_groups(&mut groups);
        debug!(groups = groups.len(), "read actual lrp groups");
        Ok(groups)
    }

    /// Every group of one process, unfiltered.
    #[instrument(skip(self))]
    pub async fn groups_by_process_guid(
        &self,
        process_guid: &str,
    ) -> DomainResult<Vec<ActualLRPGroup>> {
        let dir = actual_lrp_process_dir(process_guid);
        let process = match self.store.fetch_subtree(&dir).await {
            Ok(Some(process)) => process,
            Ok(None) => return Ok(Vec::new()),
            Err(err) => {
                error!(error = %err, "failed-fetching-actual-lrps");
                return Ok(Vec::new());
            }
        };

        let mut groups = parse_process_subtree(&process, &ActualLRPFilter::default())?;
        sort_groups(&mut groups);
        Ok(groups)
    }

    /// The group of one slot; `NotFound` when neither record exists.
    #[instrument(skip(self))]
    pub async fn group_by_process_guid_and_index(
        &self,
        process_guid: &str,
        index: i32,
    ) -> DomainResult<ActualLRPGroup> {
        let dir = actual_lrp_index_dir(process_guid, index);
        let Some(slot) = self.store.fetch_subtree(&dir).await? else {
            return Err(DomainError::NotFound(dir));
        };

        let mut group = ActualLRPGroup::default();
        for record in &slot.nodes {
            let Some(lrp) = parse_record(record)? else {
                continue;
            };
            place(&mut group, record, lrp);
        }

        if group.is_empty() {
            return Err(DomainError::NotFound(dir));
        }
        Ok(group)
    }
}

/// Groups of one `<process-guid>` subtree that pass `filter`.
///
/// A group whose instance record is outside the requested domain is dropped
/// whole; otherwise each record is kept when it matches on its own. Slots
/// left with neither side are skipped.
pub fn parse_process_subtree(
    process: &TreeNode,
    filter: &ActualLRPFilter,
) -> DomainResult<Vec<ActualLRPGroup>> {
    let mut groups = Vec::new();

    for slot in &process.nodes {
        let mut group = ActualLRPGroup::default();
        let mut instance_outside_domain = false;

        for record in &slot.nodes {
            let Some(lrp) = parse_record(record)? else {
                continue;
            };
            if record.base_name() == ACTUAL_LRP_INSTANCE_KEY && !filter.matches_domain(&lrp) {
                instance_outside_domain = true;
            }
            if filter.matches(&lrp) {
                place(&mut group, record, lrp);
            }
        }

        if !instance_outside_domain && !group.is_empty() {
            groups.push(group);
        }
    }

    Ok(groups)
}

/// Deserialize one leaf; directories without a value carry no record.
fn parse_record(node: &TreeNode) -> DomainResult<Option<ActualLRP>> {
    let Some(value) = node.value.as_deref() else {
        return Ok(None);
    };
    serde_json::from_str(value).map(Some).map_err(|e| {
        error!(key = %node.key, error = %e, "failed parsing actual lrp");
        DomainError::deserialize(&node.key, e)
    })
}

fn place(group: &mut ActualLRPGroup, record: &TreeNode, lrp: ActualLRP) {
    match record.base_name() {
        ACTUAL_LRP_INSTANCE_KEY => group.instance = Some(lrp),
        ACTUAL_LRP_EVACUATING_KEY => group.evacuating = Some(lrp),
        _ => {}
    }
}

fn sort_groups(groups: &mut [ActualLRPGroup]) {
    groups.sort_by(|a, b| {
        let key = |g: &ActualLRPGroup| g.resolve().map(|l| (l.process_guid.clone(), l.index));
        key(a).cmp(&key(b))
    });
}

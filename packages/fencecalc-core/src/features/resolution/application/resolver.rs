//! Parameter and part resolution
//!
//! Walks the region's parameters in ascending priority. Each parameter's
//! declared values are intersected with the edges contributed by every
//! strictly-lower-priority parameter that declares one; the stored value
//! survives if it is still a candidate, otherwise the tie-break rule picks
//! a replacement (or the unavailable sentinel when nothing is left). Parts
//! are then narrowed the same way by the resolved parameter values.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use fencecalc_storage::{
    CompatibilityStore, DeclaredValue, NomenclatureId, ParamValue, PartTypeId, RegionConfigStore,
    RegionId, RegionParamRow, RegionPartRow,
};

use crate::config::TieBreak;
use crate::features::resolution::domain::{Overrides, ResolvedParam, ResolvedPart, Resolution};
use crate::shared::{FenceError, Result};

/// Read-only resolver over a store; never writes
pub struct Resolver<'a, S: ?Sized> {
    store: &'a S,
    tie_break: TieBreak,
}

impl<'a, S> Resolver<'a, S>
where
    S: CompatibilityStore + RegionConfigStore + ?Sized,
{
    pub fn new(store: &'a S, tie_break: TieBreak) -> Self {
        Self { store, tie_break }
    }

    pub fn resolve(&self, region: RegionId, overrides: &Overrides) -> Result<Resolution> {
        if self.store.region(region)?.is_none() {
            return Err(FenceError::input(format!("region not found: {}", region)));
        }

        let mut working = self.store.region_params(region)?;
        let part_rows = self.store.region_parts(region)?;
        Self::check_overrides(region, overrides, &working, &part_rows)?;

        for row in working.iter_mut() {
            if let Some(value) = overrides.params.get(&row.param_type) {
                row.value = *value;
            }
        }
        // stable: equal priorities keep stored row order
        working.sort_by_key(|row| row.priority);

        let mut params = BTreeMap::new();
        for i in 0..working.len() {
            let (done, rest) = working.split_at_mut(i);
            let current = &mut rest[0];
            let resolved = self.resolve_param(current, done)?;
            debug!(
                "region {}: param {} {} -> {} ({} candidates)",
                region,
                current.param_type,
                current.value,
                resolved.value,
                resolved.candidates.len()
            );
            current.value = resolved.value;
            params.insert(current.param_type, resolved);
        }

        let mut selections: BTreeMap<PartTypeId, Option<NomenclatureId>> = BTreeMap::new();
        for row in &part_rows {
            // lowest row id wins when a part type occurs in several components
            selections.entry(row.part_type).or_insert(row.nomenclature);
        }
        for (part_type, nomenclature) in &overrides.parts {
            selections.insert(*part_type, Some(*nomenclature));
        }

        let mut parts = BTreeMap::new();
        for (part_type, selection) in selections {
            let resolved = self.resolve_part(part_type, selection, &working)?;
            if resolved.nomenclature != selection {
                debug!(
                    "region {}: part {} {:?} -> {:?}",
                    region, part_type, selection, resolved.nomenclature
                );
            }
            parts.insert(part_type, resolved);
        }

        Ok(Resolution {
            region,
            params,
            parts,
        })
    }

    fn check_overrides(
        region: RegionId,
        overrides: &Overrides,
        params: &[RegionParamRow],
        parts: &[RegionPartRow],
    ) -> Result<()> {
        let known: HashSet<_> = params.iter().map(|p| p.param_type).collect();
        for (param_type, value) in &overrides.params {
            if !known.contains(param_type) {
                return Err(FenceError::input(format!(
                    "parameter type {} is not part of region {}",
                    param_type, region
                )));
            }
            if !value.is_finite() {
                return Err(FenceError::input(format!(
                    "parameter type {}: value must be finite",
                    param_type
                )));
            }
        }

        let known: HashSet<_> = parts.iter().map(|p| p.part_type).collect();
        if let Some(part_type) = overrides.parts.keys().find(|p| !known.contains(p)) {
            return Err(FenceError::input(format!(
                "part type {} is not part of region {}",
                part_type, region
            )));
        }
        Ok(())
    }

    fn resolve_param(
        &self,
        current: &RegionParamRow,
        predecessors: &[RegionParamRow],
    ) -> Result<ResolvedParam> {
        let mut candidates = self.store.declared_values(current.param_type)?;
        let mut constrained = false;

        for prev in predecessors.iter().filter(|p| p.priority < current.priority) {
            let allowed =
                self.store
                    .dependent_values(prev.param_type, prev.value, current.param_type)?;
            if allowed.is_empty() {
                continue;
            }
            constrained = true;
            candidates.retain(|c| allowed.contains(&c.value));
        }

        let value = if candidates.iter().any(|c| c.value == current.value) {
            current.value
        } else if let Some(value) = self.pick(&candidates) {
            value
        } else if constrained {
            debug!(
                "param {} has no valid value, marking unavailable",
                current.param_type
            );
            ParamValue::UNAVAILABLE
        } else {
            current.value
        };

        Ok(ResolvedParam {
            value,
            priority: current.priority,
            candidates: candidates.into_iter().map(|c| (c.value, c.label)).collect(),
            constrained,
        })
    }

    fn pick(&self, candidates: &[DeclaredValue]) -> Option<ParamValue> {
        match self.tie_break {
            TieBreak::SmallestValue => candidates.iter().map(|c| c.value).min(),
            TieBreak::FirstDeclared => candidates.first().map(|c| c.value),
        }
    }

    fn resolve_part(
        &self,
        part_type: PartTypeId,
        selection: Option<NomenclatureId>,
        params: &[RegionParamRow],
    ) -> Result<ResolvedPart> {
        let mut candidates = self.store.part_nomenclature(part_type)?;
        candidates.sort();
        candidates.dedup();

        for param in params {
            let allowed =
                self.store
                    .nomenclature_for_param(param.param_type, param.value, part_type)?;
            if allowed.is_empty() {
                continue;
            }
            candidates.retain(|c| c.map_or(false, |id| allowed.contains(&id)));
        }

        let nomenclature = if candidates.contains(&selection) {
            selection
        } else {
            candidates.first().copied().flatten()
        };

        Ok(ResolvedPart {
            nomenclature,
            candidates,
        })
    }
}

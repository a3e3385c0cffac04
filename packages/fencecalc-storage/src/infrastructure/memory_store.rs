//! In-Memory Config Store
//!
//! BTreeMap/Vec tables behind a `RwLock`. Writes are staged on a copy of
//! the tables and swapped in only when every statement succeeded, which
//! gives the same all-or-nothing behaviour as the SQLite transaction.
//! A `FaultPlan` can fail a chosen parameter update to exercise rollback.

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::domain::models::{
    CatalogSeed, ComponentId, ComponentTypeId, ConfigUpdate, NewRegion, NomenclatureEdge,
    NomenclatureId, NomenclatureImport, NomenclatureRow, ParamEdge, ParamTypeId, ParamTypeRow,
    ParamValue, ParamValueRow, PartTypeId, PartTypeRow, RegionId, RegionParamRow, RegionPartRow,
    RegionRow, RegionTypeId,
};
use crate::domain::ports::{
    CatalogBootstrap, CompatibilityStore, DeclaredValue, RegionConfigStore, RegionConfigWriter,
    RegionRepository,
};
use crate::{Result, StorageError};

#[derive(Debug, Clone)]
struct ParamInstance {
    id: i64,
    region: RegionId,
    param_type: ParamTypeId,
    value: ParamValue,
}

#[derive(Debug, Clone)]
struct ComponentInstance {
    id: ComponentId,
    region: RegionId,
}

#[derive(Debug, Clone)]
struct PartInstance {
    id: i64,
    component: ComponentId,
    part_type: PartTypeId,
    nomenclature: Option<NomenclatureId>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    region_types: BTreeSet<RegionTypeId>,
    param_types: BTreeMap<ParamTypeId, ParamTypeRow>,
    param_values: Vec<ParamValueRow>,
    param_regions: Vec<(ParamTypeId, RegionTypeId)>,
    param_edges: Vec<ParamEdge>,
    part_types: BTreeMap<PartTypeId, PartTypeRow>,
    region_components: Vec<(RegionTypeId, ComponentTypeId)>,
    param_parts: BTreeSet<(ParamTypeId, PartTypeId)>,

    nomenclature: BTreeMap<NomenclatureId, NomenclatureRow>,
    part_nomenclature: Vec<(PartTypeId, Option<NomenclatureId>)>,
    nomenclature_edges: Vec<NomenclatureEdge>,

    regions: BTreeMap<RegionId, RegionRow>,
    params: Vec<ParamInstance>,
    components: Vec<ComponentInstance>,
    parts: Vec<PartInstance>,
    last_row_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_row_id += 1;
        self.last_row_id
    }

    fn region_component_ids(&self, region: RegionId) -> BTreeSet<ComponentId> {
        self.components
            .iter()
            .filter(|c| c.region == region)
            .map(|c| c.id)
            .collect()
    }
}

/// Injected storage faults
#[derive(Debug, Clone, Default)]
struct FaultPlan {
    /// 1-based index of the parameter update that fails
    fail_on_param_update: Option<usize>,
}

#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<Mutex<FaultPlan>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store already seeded with `seed`
    pub fn with_seed(seed: &CatalogSeed) -> Result<Self> {
        let store = Self::new();
        store.bootstrap(seed)?;
        Ok(store)
    }

    /// Make the `n`-th parameter update (1-based) of every following
    /// `apply_update` fail
    pub fn fail_on_param_update(&self, n: usize) {
        self.faults.lock().fail_on_param_update = Some(n);
    }

    pub fn clear_faults(&self) {
        *self.faults.lock() = FaultPlan::default();
    }
}

impl CompatibilityStore for InMemoryConfigStore {
    fn declared_values(&self, param_type: ParamTypeId) -> Result<Vec<DeclaredValue>> {
        Ok(self
            .tables
            .read()
            .param_values
            .iter()
            .filter(|v| v.param_type == param_type)
            .map(|v| DeclaredValue {
                value: v.value,
                label: v.label.clone(),
            })
            .collect())
    }

    fn dependent_values(
        &self,
        param_type: ParamTypeId,
        value: ParamValue,
        dependent_type: ParamTypeId,
    ) -> Result<Vec<ParamValue>> {
        let tables = self.tables.read();
        let mut values: Vec<ParamValue> = tables
            .param_edges
            .iter()
            .filter(|e| {
                e.param_type == param_type && e.value == value && e.dependent_type == dependent_type
            })
            .map(|e| e.dependent_value)
            .collect();
        values.sort();
        Ok(values)
    }

    fn part_nomenclature(&self, part_type: PartTypeId) -> Result<Vec<Option<NomenclatureId>>> {
        let tables = self.tables.read();
        let mut ids: Vec<Option<NomenclatureId>> = tables
            .part_nomenclature
            .iter()
            .filter(|(p, _)| *p == part_type)
            .map(|(_, n)| *n)
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn nomenclature_for_param(
        &self,
        param_type: ParamTypeId,
        value: ParamValue,
        part_type: PartTypeId,
    ) -> Result<Vec<NomenclatureId>> {
        let tables = self.tables.read();
        if !tables.param_parts.contains(&(param_type, part_type)) {
            return Ok(Vec::new());
        }
        let mut ids: Vec<NomenclatureId> = tables
            .nomenclature_edges
            .iter()
            .filter(|e| e.param_type == param_type && e.value == value)
            .map(|e| e.nomenclature)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

impl RegionConfigStore for InMemoryConfigStore {
    fn region(&self, region: RegionId) -> Result<Option<RegionRow>> {
        Ok(self.tables.read().regions.get(&region).cloned())
    }

    fn region_params(&self, region: RegionId) -> Result<Vec<RegionParamRow>> {
        let tables = self.tables.read();
        let mut rows = Vec::new();
        for instance in tables.params.iter().filter(|p| p.region == region) {
            let priority = tables
                .param_types
                .get(&instance.param_type)
                .map(|t| t.priority)
                .ok_or_else(|| {
                    StorageError::integrity(format!(
                        "param row {} references unknown param type {}",
                        instance.id, instance.param_type
                    ))
                })?;
            rows.push((
                instance.id,
                RegionParamRow {
                    param_type: instance.param_type,
                    priority,
                    value: instance.value,
                },
            ));
        }
        rows.sort_by_key(|(id, row)| (row.priority, *id));
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    fn region_parts(&self, region: RegionId) -> Result<Vec<RegionPartRow>> {
        let tables = self.tables.read();
        let components = tables.region_component_ids(region);
        let mut rows: Vec<&PartInstance> = tables
            .parts
            .iter()
            .filter(|p| components.contains(&p.component))
            .collect();
        rows.sort_by_key(|p| p.id);
        Ok(rows
            .into_iter()
            .map(|p| RegionPartRow {
                part_type: p.part_type,
                component: p.component,
                nomenclature: p.nomenclature,
            })
            .collect())
    }
}

impl RegionConfigWriter for InMemoryConfigStore {
    fn apply_update(&self, region: RegionId, update: &ConfigUpdate) -> Result<()> {
        let fault = self.faults.lock().clone();
        let mut tables = self.tables.write();
        let mut staged = tables.clone();

        for (n, (param_type, value)) in update.params.iter().enumerate() {
            if fault.fail_on_param_update == Some(n + 1) {
                return Err(StorageError::transaction(format!(
                    "injected fault on parameter update #{} (param type {})",
                    n + 1,
                    param_type
                )));
            }
            let row = staged
                .params
                .iter_mut()
                .find(|p| p.region == region && p.param_type == *param_type)
                .ok_or_else(|| {
                    StorageError::integrity(format!(
                        "no param row for region {}, param type {}",
                        region, param_type
                    ))
                })?;
            row.value = *value;
        }

        let components = staged.region_component_ids(region);
        for (part_type, nomenclature) in &update.parts {
            let mut touched = 0;
            for part in staged
                .parts
                .iter_mut()
                .filter(|p| p.part_type == *part_type && components.contains(&p.component))
            {
                part.nomenclature = *nomenclature;
                touched += 1;
            }
            if touched == 0 {
                return Err(StorageError::integrity(format!(
                    "no part row for region {}, part type {}",
                    region, part_type
                )));
            }
        }

        *tables = staged;
        debug!(
            region = region.0,
            params = update.params.len(),
            parts = update.parts.len(),
            "applied in-memory config update"
        );
        Ok(())
    }
}

impl RegionRepository for InMemoryConfigStore {
    fn create_region(&self, new: &NewRegion) -> Result<RegionId> {
        let mut tables = self.tables.write();
        if !tables.region_types.contains(&new.region_type) {
            return Err(StorageError::not_found("region type", new.region_type));
        }

        let region = RegionId(tables.next_id());
        tables.regions.insert(
            region,
            RegionRow {
                id: region,
                project_id: new.project_id,
                region_type: new.region_type,
                description: new.description.clone(),
                nr: new.nr,
                created_at: Utc::now(),
            },
        );

        // Parameters: smallest declared value, 0 when none declared
        let param_types: BTreeSet<ParamTypeId> = tables
            .param_regions
            .iter()
            .filter(|(_, rt)| *rt == new.region_type)
            .map(|(pt, _)| *pt)
            .collect();
        for param_type in param_types {
            let value = tables
                .param_values
                .iter()
                .filter(|v| v.param_type == param_type)
                .map(|v| v.value)
                .min()
                .unwrap_or(ParamValue::new(0.0));
            let id = tables.next_id();
            tables.params.push(ParamInstance {
                id,
                region,
                param_type,
                value,
            });
        }

        // Components and their parts: smallest allowed nomenclature
        let component_types: Vec<ComponentTypeId> = tables
            .region_components
            .iter()
            .filter(|(rt, _)| *rt == new.region_type)
            .map(|(_, ct)| *ct)
            .collect();
        for component_type in component_types {
            let component = ComponentId(tables.next_id());
            tables.components.push(ComponentInstance {
                id: component,
                region,
            });
            let part_types: Vec<PartTypeId> = tables
                .part_types
                .values()
                .filter(|p| p.component_type == component_type)
                .map(|p| p.id)
                .collect();
            for part_type in part_types {
                let nomenclature = tables
                    .part_nomenclature
                    .iter()
                    .filter(|(p, _)| *p == part_type)
                    .filter_map(|(_, n)| *n)
                    .min();
                let id = tables.next_id();
                tables.parts.push(PartInstance {
                    id,
                    component,
                    part_type,
                    nomenclature,
                });
            }
        }

        Ok(region)
    }

    fn delete_region(&self, region: RegionId) -> Result<bool> {
        let mut tables = self.tables.write();
        if tables.regions.remove(&region).is_none() {
            return Ok(false);
        }
        let components = tables.region_component_ids(region);
        tables.parts.retain(|p| !components.contains(&p.component));
        tables.components.retain(|c| c.region != region);
        tables.params.retain(|p| p.region != region);
        Ok(true)
    }

    fn count_regions(&self, project_id: i64, region_type: RegionTypeId) -> Result<usize> {
        Ok(self
            .tables
            .read()
            .regions
            .values()
            .filter(|r| r.project_id == project_id && r.region_type == region_type)
            .count())
    }

    fn nomenclature_names(
        &self,
        ids: &[NomenclatureId],
    ) -> Result<HashMap<NomenclatureId, String>> {
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.nomenclature.get(id).map(|n| (*id, n.name.clone())))
            .collect())
    }
}

impl CatalogBootstrap for InMemoryConfigStore {
    fn is_bootstrapped(&self) -> Result<bool> {
        Ok(!self.tables.read().param_types.is_empty())
    }

    fn bootstrap(&self, seed: &CatalogSeed) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.param_types.is_empty() {
            return Err(StorageError::integrity("catalog is already bootstrapped"));
        }
        tables.region_types = seed.region_types.iter().map(|r| r.id).collect();
        tables.param_types = seed.param_types.iter().map(|p| (p.id, p.clone())).collect();
        tables.param_values = seed.param_values.clone();
        tables.param_regions = seed.param_regions.clone();
        tables.param_edges = seed.param_edges.clone();
        tables.part_types = seed.part_types.iter().map(|p| (p.id, p.clone())).collect();
        tables.region_components = seed.region_components.clone();
        tables.param_parts = seed.param_parts.iter().copied().collect();
        debug!(
            param_types = seed.param_types.len(),
            edges = seed.param_edges.len(),
            "bootstrapped in-memory catalog"
        );
        Ok(())
    }

    fn import_nomenclature(&self, import: &NomenclatureImport) -> Result<()> {
        let mut tables = self.tables.write();
        let mut staged = tables.clone();
        for row in &import.nomenclature {
            staged.nomenclature.insert(row.id, row.clone());
        }
        for (part_type, nomenclature) in &import.part_nomenclature {
            if !staged.part_types.contains_key(part_type) {
                return Err(StorageError::not_found("part type", part_type));
            }
            if let Some(id) = nomenclature {
                if !staged.nomenclature.contains_key(id) {
                    return Err(StorageError::not_found("nomenclature", id));
                }
            }
            staged.part_nomenclature.push((*part_type, *nomenclature));
        }
        for edge in &import.param_nomenclature {
            if !staged.nomenclature.contains_key(&edge.nomenclature) {
                return Err(StorageError::not_found("nomenclature", edge.nomenclature));
            }
            if !staged.nomenclature_edges.contains(edge) {
                staged.nomenclature_edges.push(*edge);
            }
        }
        *tables = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ComponentTypeRow, RegionTypeRow};
    use crate::ErrorKind;

    fn seed() -> CatalogSeed {
        let pt = |id: i64, priority: i32| ParamTypeRow {
            id: ParamTypeId(id),
            priority,
            name: format!("param {}", id),
            description: String::new(),
        };
        let pv = |param: i64, value: f64| ParamValueRow {
            param_type: ParamTypeId(param),
            value: ParamValue::new(value),
            label: String::new(),
        };
        CatalogSeed {
            region_types: vec![RegionTypeRow {
                id: RegionTypeId(1),
                name: "fence".into(),
            }],
            param_types: vec![pt(1, 0), pt(2, 1), pt(3, 0)],
            param_values: vec![pv(1, 1.0), pv(1, 0.0), pv(2, 5.0), pv(2, 6.0)],
            param_regions: vec![
                (ParamTypeId(2), RegionTypeId(1)),
                (ParamTypeId(1), RegionTypeId(1)),
                (ParamTypeId(3), RegionTypeId(1)),
            ],
            param_edges: vec![ParamEdge {
                param_type: ParamTypeId(1),
                value: ParamValue::new(1.0),
                dependent_type: ParamTypeId(2),
                dependent_value: ParamValue::UNAVAILABLE,
            }],
            component_types: vec![ComponentTypeRow {
                id: ComponentTypeId(0),
                name: "columns".into(),
            }],
            part_types: vec![PartTypeRow {
                id: PartTypeId(1),
                component_type: ComponentTypeId(0),
                name: "column".into(),
            }],
            region_components: vec![(RegionTypeId(1), ComponentTypeId(0))],
            param_parts: vec![(ParamTypeId(1), PartTypeId(1))],
        }
    }

    fn import() -> NomenclatureImport {
        let n = |id: i64| NomenclatureRow {
            id: NomenclatureId(id),
            name: format!("item {}", id),
            vendor_code: String::new(),
        };
        NomenclatureImport {
            nomenclature: vec![n(100), n(101)],
            part_nomenclature: vec![
                (PartTypeId(1), Some(NomenclatureId(101))),
                (PartTypeId(1), Some(NomenclatureId(100))),
            ],
            param_nomenclature: vec![NomenclatureEdge {
                param_type: ParamTypeId(1),
                value: ParamValue::new(0.0),
                nomenclature: NomenclatureId(101),
            }],
        }
    }

    fn store_with_region() -> (InMemoryConfigStore, RegionId) {
        let store = InMemoryConfigStore::with_seed(&seed()).unwrap();
        store.import_nomenclature(&import()).unwrap();
        let region = store
            .create_region(&NewRegion {
                project_id: 1,
                region_type: RegionTypeId(1),
                description: "north side".into(),
                nr: 1,
            })
            .unwrap();
        (store, region)
    }

    #[test]
    fn test_create_region_defaults() {
        let (store, region) = store_with_region();

        let params = store.region_params(region).unwrap();
        let summary: Vec<(i64, i32, f64)> = params
            .iter()
            .map(|p| (p.param_type.0, p.priority, p.value.get()))
            .collect();
        // priority first, then row order (param type id order at creation)
        assert_eq!(summary, vec![(1, 0, 0.0), (3, 0, 0.0), (2, 1, 5.0)]);

        let parts = store.region_parts(region).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].nomenclature, Some(NomenclatureId(100)));
    }

    #[test]
    fn test_create_region_unknown_type() {
        let store = InMemoryConfigStore::with_seed(&seed()).unwrap();
        let err = store
            .create_region(&NewRegion {
                project_id: 1,
                region_type: RegionTypeId(99),
                description: String::new(),
                nr: 0,
            })
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_lookups() {
        let (store, _) = store_with_region();

        assert_eq!(
            store
                .dependent_values(ParamTypeId(1), ParamValue::new(1.0), ParamTypeId(2))
                .unwrap(),
            vec![ParamValue::UNAVAILABLE]
        );
        assert!(store
            .dependent_values(ParamTypeId(1), ParamValue::new(0.0), ParamTypeId(2))
            .unwrap()
            .is_empty());
        assert_eq!(
            store.part_nomenclature(PartTypeId(1)).unwrap(),
            vec![Some(NomenclatureId(100)), Some(NomenclatureId(101))]
        );
        assert_eq!(
            store
                .nomenclature_for_param(ParamTypeId(1), ParamValue::new(0.0), PartTypeId(1))
                .unwrap(),
            vec![NomenclatureId(101)]
        );
        // param 3 is not linked to the part
        assert!(store
            .nomenclature_for_param(ParamTypeId(3), ParamValue::new(0.0), PartTypeId(1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_apply_update() {
        let (store, region) = store_with_region();
        let update = ConfigUpdate {
            params: vec![(ParamTypeId(2), ParamValue::new(6.0))],
            parts: vec![(PartTypeId(1), None)],
        };
        store.apply_update(region, &update).unwrap();

        let params = store.region_params(region).unwrap();
        assert_eq!(params[2].value, ParamValue::new(6.0));
        assert_eq!(store.region_parts(region).unwrap()[0].nomenclature, None);
    }

    #[test]
    fn test_apply_update_rolls_back_on_fault() {
        let (store, region) = store_with_region();
        let before = store.region_params(region).unwrap();

        store.fail_on_param_update(2);
        let update = ConfigUpdate {
            params: vec![
                (ParamTypeId(1), ParamValue::new(1.0)),
                (ParamTypeId(2), ParamValue::new(6.0)),
                (ParamTypeId(3), ParamValue::new(4.0)),
            ],
            parts: vec![],
        };
        let err = store.apply_update(region, &update).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transaction);
        assert_eq!(store.region_params(region).unwrap(), before);

        store.clear_faults();
        store.apply_update(region, &update).unwrap();
        assert_ne!(store.region_params(region).unwrap(), before);
    }

    #[test]
    fn test_apply_update_missing_row_is_integrity_error() {
        let (store, region) = store_with_region();
        let update = ConfigUpdate {
            params: vec![
                (ParamTypeId(1), ParamValue::new(1.0)),
                (ParamTypeId(42), ParamValue::new(1.0)),
            ],
            parts: vec![],
        };
        let err = store.apply_update(region, &update).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Integrity);
        assert_eq!(
            store.region_params(region).unwrap()[0].value,
            ParamValue::new(0.0)
        );
    }

    #[test]
    fn test_delete_region() {
        let (store, region) = store_with_region();
        assert_eq!(store.count_regions(1, RegionTypeId(1)).unwrap(), 1);

        assert!(store.delete_region(region).unwrap());
        assert!(!store.delete_region(region).unwrap());
        assert!(store.region(region).unwrap().is_none());
        assert!(store.region_params(region).unwrap().is_empty());
        assert!(store.region_parts(region).unwrap().is_empty());
        assert_eq!(store.count_regions(1, RegionTypeId(1)).unwrap(), 0);
    }

    #[test]
    fn test_bootstrap_twice_fails() {
        let store = InMemoryConfigStore::with_seed(&seed()).unwrap();
        assert!(store.is_bootstrapped().unwrap());
        assert_eq!(
            store.bootstrap(&seed()).unwrap_err().kind,
            ErrorKind::Integrity
        );
    }

    #[test]
    fn test_nomenclature_names() {
        let (store, _) = store_with_region();
        let names = store
            .nomenclature_names(&[NomenclatureId(100), NomenclatureId(7)])
            .unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[&NomenclatureId(100)], "item 100");
    }

    #[test]
    fn test_failed_import_leaves_nothing_behind() {
        let store = InMemoryConfigStore::with_seed(&seed()).unwrap();
        let err = store
            .import_nomenclature(&NomenclatureImport {
                nomenclature: vec![NomenclatureRow {
                    id: NomenclatureId(100),
                    name: "n".into(),
                    vendor_code: String::new(),
                }],
                part_nomenclature: vec![
                    (PartTypeId(1), Some(NomenclatureId(100))),
                    (PartTypeId(99), None),
                ],
                param_nomenclature: vec![],
            })
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        assert!(store.part_nomenclature(PartTypeId(1)).unwrap().is_empty());
        assert!(store
            .nomenclature_names(&[NomenclatureId(100)])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_region_parts_in_row_order() {
        let mut seed = seed();
        seed.part_types.push(PartTypeRow {
            id: PartTypeId(2),
            component_type: ComponentTypeId(0),
            name: "cap".into(),
        });
        let store = InMemoryConfigStore::with_seed(&seed).unwrap();
        let first = store
            .create_region(&NewRegion {
                project_id: 1,
                region_type: RegionTypeId(1),
                description: String::new(),
                nr: 1,
            })
            .unwrap();
        let second = store
            .create_region(&NewRegion {
                project_id: 1,
                region_type: RegionTypeId(1),
                description: String::new(),
                nr: 2,
            })
            .unwrap();

        for region in [first, second] {
            let parts: Vec<PartTypeId> = store
                .region_parts(region)
                .unwrap()
                .iter()
                .map(|p| p.part_type)
                .collect();
            assert_eq!(parts, vec![PartTypeId(1), PartTypeId(2)]);
        }
    }
}

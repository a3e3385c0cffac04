//! Region lifecycle on top of the resolver
//!
//! Every operation that writes (`create_region`, `update_region`,
//! `delete_region`) runs resolve + persist for one region under that
//! region's lock, unless `serialize_region_edits` is off.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use fencecalc_storage::{ConfigStore, NewRegion, NomenclatureId, NomenclatureImport, RegionId};

use super::view::{NomenclatureOption, ParamView, PartView, RegionView, ValueOption};
use crate::config::{FenceConfig, TieBreak};
use crate::features::catalog::Catalog;
use crate::features::resolution::{ConfigWriter, Overrides, Resolution, Resolver};
use crate::shared::{FenceError, Result};

pub struct RegionService<S: ?Sized> {
    store: Arc<S>,
    catalog: Arc<Catalog>,
    tie_break: TieBreak,
    serialize_edits: bool,
    locks: DashMap<RegionId, Arc<Mutex<()>>>,
    /// Guards the one-project-region check against concurrent creates
    create_lock: Mutex<()>,
}

impl<S> RegionService<S>
where
    S: ConfigStore + ?Sized,
{
    pub fn new(store: Arc<S>, catalog: Arc<Catalog>, config: &FenceConfig) -> Self {
        Self {
            store,
            catalog,
            tie_break: config.tie_break,
            serialize_edits: config.serialize_region_edits,
            locks: DashMap::new(),
            create_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Seed the catalog into an empty store. Returns `false` when the
    /// store was already bootstrapped.
    pub fn bootstrap(&self) -> Result<bool> {
        if self.store.is_bootstrapped()? {
            debug!("Catalog already bootstrapped");
            return Ok(false);
        }
        self.catalog.validate()?;
        let seed = self.catalog.seed();
        self.store.bootstrap(&seed)?;
        info!(
            "Bootstrapped catalog: {} region types, {} param types, {} edges",
            seed.region_types.len(),
            seed.param_types.len(),
            seed.param_edges.len()
        );
        Ok(true)
    }

    pub fn import_nomenclature(&self, import: &NomenclatureImport) -> Result<()> {
        self.store.import_nomenclature(import)?;
        info!(
            "Imported {} nomenclature items, {} part links, {} param edges",
            import.nomenclature.len(),
            import.part_nomenclature.len(),
            import.param_nomenclature.len()
        );
        Ok(())
    }

    /// Insert a region with catalog defaults and normalize it.
    ///
    /// If normalization fails the inserted rows are removed again.
    pub fn create_region(&self, new: &NewRegion) -> Result<RegionView> {
        if self.catalog.region_type(new.region_type).is_none() {
            return Err(FenceError::input(format!(
                "unknown region type: {}",
                new.region_type
            )));
        }

        let region = {
            let _guard = self.create_lock.lock();
            if Some(new.region_type) == self.catalog.project_region_type
                && self.store.count_regions(new.project_id, new.region_type)? > 0
            {
                return Err(FenceError::input(format!(
                    "project {} already has a project region",
                    new.project_id
                )));
            }
            self.store.create_region(new)?
        };

        let normalized = self.with_region_lock(region, || {
            let resolution = self.resolver().resolve(region, &Overrides::default())?;
            ConfigWriter::new(self.store.as_ref()).persist(region, &resolution)?;
            self.build_view(region, &resolution)
        });

        match normalized {
            Ok(view) => {
                info!(
                    "Created region {} (project {}, type {})",
                    region, new.project_id, new.region_type
                );
                Ok(view)
            }
            Err(err) => {
                if let Err(cleanup) = self.store.delete_region(region) {
                    warn!("Failed to remove region {} after error: {}", region, cleanup);
                }
                Err(err)
            }
        }
    }

    /// Resolve with `overrides`, persist, and return the new state
    pub fn update_region(&self, region: RegionId, overrides: &Overrides) -> Result<RegionView> {
        self.with_region_lock(region, || {
            let resolution = self.resolver().resolve(region, overrides)?;
            ConfigWriter::new(self.store.as_ref()).persist(region, &resolution)?;
            info!(
                "Updated region {}: {} param overrides, {} part overrides",
                region,
                overrides.params.len(),
                overrides.parts.len()
            );
            self.build_view(region, &resolution)
        })
    }

    /// Current resolved state; nothing is written
    pub fn view_region(&self, region: RegionId) -> Result<RegionView> {
        let resolution = self.resolver().resolve(region, &Overrides::default())?;
        self.build_view(region, &resolution)
    }

    pub fn delete_region(&self, region: RegionId) -> Result<bool> {
        let deleted = self.with_region_lock(region, || Ok(self.store.delete_region(region)?))?;
        self.locks.remove(&region);
        if deleted {
            info!("Deleted region {}", region);
        }
        Ok(deleted)
    }

    fn resolver(&self) -> Resolver<'_, S> {
        Resolver::new(self.store.as_ref(), self.tie_break)
    }

    fn with_region_lock<T>(&self, region: RegionId, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if !self.serialize_edits {
            return f();
        }
        let existing = self.locks.get(&region).map(|lock| lock.clone());
        let lock = match existing {
            Some(lock) => lock,
            // unknown ids get no entry; `f` reports them
            None if self.store.region(region)?.is_none() => return f(),
            None => self
                .locks
                .entry(region)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone(),
        };
        let _guard = lock.lock();
        f()
    }

    fn build_view(&self, region: RegionId, resolution: &Resolution) -> Result<RegionView> {
        let row = self
            .store
            .region(region)?
            .ok_or_else(|| FenceError::input(format!("region not found: {}", region)))?;
        let region_type_name = self
            .catalog
            .region_type(row.region_type)
            .map(|r| r.name.clone())
            .unwrap_or_default();

        let mut params = Vec::with_capacity(resolution.params.len());
        for (id, resolved) in &resolution.params {
            let decl = self.catalog.param(*id).ok_or_else(|| {
                FenceError::catalog(format!("stored parameter type {} is not in the catalog", id))
            })?;
            let label = resolved.candidates.get(&resolved.value).cloned().or_else(|| {
                self.catalog
                    .expanded_values(decl)
                    .into_iter()
                    .find(|(v, _)| *v == resolved.value)
                    .map(|(_, label)| label)
            });
            params.push(ParamView {
                id: *id,
                name: decl.name.clone(),
                description: decl.description.clone(),
                priority: resolved.priority,
                value: resolved.value,
                label,
                unavailable: resolved.is_unavailable(),
                control: self
                    .catalog
                    .control_hint(decl, resolved.candidates.len()),
                candidates: resolved
                    .candidates
                    .iter()
                    .map(|(value, label)| ValueOption {
                        value: *value,
                        label: label.clone(),
                    })
                    .collect(),
            });
        }

        let ids: Vec<NomenclatureId> = resolution
            .parts
            .values()
            .flat_map(|p| p.candidates.iter().chain(std::iter::once(&p.nomenclature)))
            .filter_map(|id| *id)
            .collect();
        let names = self.store.nomenclature_names(&ids)?;

        let parts = resolution
            .parts
            .iter()
            .map(|(id, resolved)| PartView {
                id: *id,
                name: self
                    .catalog
                    .part_type(*id)
                    .map(|p| p.name.to_string())
                    .unwrap_or_default(),
                nomenclature: resolved.nomenclature,
                nomenclature_name: resolved
                    .nomenclature
                    .and_then(|n| names.get(&n).cloned()),
                candidates: resolved
                    .candidates
                    .iter()
                    .map(|c| NomenclatureOption {
                        id: *c,
                        name: c.and_then(|n| names.get(&n).cloned()),
                    })
                    .collect(),
            })
            .collect();

        Ok(RegionView {
            id: row.id,
            project_id: row.project_id,
            region_type: row.region_type,
            region_type_name,
            description: row.description,
            nr: row.nr,
            created_at: row.created_at,
            params,
            parts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::catalog::standard::{params, parts, region_types};
    use crate::features::catalog::ControlKind;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    use fencecalc_storage::{
        CatalogBootstrap, CatalogSeed, CompatibilityStore, ConfigUpdate, DeclaredValue,
        InMemoryConfigStore, NomenclatureEdge, NomenclatureRow, ParamTypeId, ParamValue,
        PartTypeId, RegionConfigStore, RegionConfigWriter, RegionParamRow, RegionPartRow,
        RegionRepository, RegionRow, RegionTypeId,
    };

    type StoreResult<T> = fencecalc_storage::Result<T>;

    /// In-memory store that records how many resolve+persist sections are
    /// open per region. A section opens in `region_params` and closes in
    /// `apply_update`; both sleep so overlapping sections are observable.
    #[derive(Default)]
    struct SlowStore {
        inner: InMemoryConfigStore,
        armed: AtomicBool,
        active: Mutex<HashMap<RegionId, usize>>,
        max_per_region: AtomicUsize,
        max_total: AtomicUsize,
    }

    impl SlowStore {
        fn enter(&self, region: RegionId) {
            if !self.armed.load(Ordering::SeqCst) {
                return;
            }
            {
                let mut active = self.active.lock();
                let count = active.entry(region).or_insert(0);
                *count += 1;
                self.max_per_region.fetch_max(*count, Ordering::SeqCst);
                let total = active.values().sum();
                self.max_total.fetch_max(total, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_millis(60));
        }

        fn leave(&self, region: RegionId) {
            if !self.armed.load(Ordering::SeqCst) {
                return;
            }
            thread::sleep(Duration::from_millis(20));
            if let Some(count) = self.active.lock().get_mut(&region) {
                *count -= 1;
            }
        }
    }

    impl CompatibilityStore for SlowStore {
        fn declared_values(&self, param_type: ParamTypeId) -> StoreResult<Vec<DeclaredValue>> {
            self.inner.declared_values(param_type)
        }

        fn dependent_values(
            &self,
            param_type: ParamTypeId,
            value: ParamValue,
            dependent_type: ParamTypeId,
        ) -> StoreResult<Vec<ParamValue>> {
            self.inner.dependent_values(param_type, value, dependent_type)
        }

        fn part_nomenclature(
            &self,
            part_type: PartTypeId,
        ) -> StoreResult<Vec<Option<NomenclatureId>>> {
            self.inner.part_nomenclature(part_type)
        }

        fn nomenclature_for_param(
            &self,
            param_type: ParamTypeId,
            value: ParamValue,
            part_type: PartTypeId,
        ) -> StoreResult<Vec<NomenclatureId>> {
            self.inner.nomenclature_for_param(param_type, value, part_type)
        }
    }

    impl RegionConfigStore for SlowStore {
        fn region(&self, region: RegionId) -> StoreResult<Option<RegionRow>> {
            self.inner.region(region)
        }

        fn region_params(&self, region: RegionId) -> StoreResult<Vec<RegionParamRow>> {
            self.enter(region);
            self.inner.region_params(region)
        }

        fn region_parts(&self, region: RegionId) -> StoreResult<Vec<RegionPartRow>> {
            self.inner.region_parts(region)
        }
    }

    impl RegionConfigWriter for SlowStore {
        fn apply_update(&self, region: RegionId, update: &ConfigUpdate) -> StoreResult<()> {
            let applied = self.inner.apply_update(region, update);
            self.leave(region);
            applied
        }
    }

    impl RegionRepository for SlowStore {
        fn create_region(&self, region: &NewRegion) -> StoreResult<RegionId> {
            self.inner.create_region(region)
        }

        fn delete_region(&self, region: RegionId) -> StoreResult<bool> {
            self.inner.delete_region(region)
        }

        fn count_regions(&self, project_id: i64, region_type: RegionTypeId) -> StoreResult<usize> {
            self.inner.count_regions(project_id, region_type)
        }

        fn nomenclature_names(
            &self,
            ids: &[NomenclatureId],
        ) -> StoreResult<HashMap<NomenclatureId, String>> {
            self.inner.nomenclature_names(ids)
        }
    }

    impl CatalogBootstrap for SlowStore {
        fn is_bootstrapped(&self) -> StoreResult<bool> {
            self.inner.is_bootstrapped()
        }

        fn bootstrap(&self, seed: &CatalogSeed) -> StoreResult<()> {
            self.inner.bootstrap(seed)
        }

        fn import_nomenclature(&self, import: &NomenclatureImport) -> StoreResult<()> {
            self.inner.import_nomenclature(import)
        }
    }

    /// Run one `update_region` per target from separate threads, released
    /// together
    fn concurrent_updates(service: &RegionService<SlowStore>, targets: &[RegionId]) {
        let barrier = Barrier::new(targets.len());
        thread::scope(|scope| {
            for (i, region) in targets.iter().enumerate() {
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    service
                        .update_region(
                            *region,
                            &Overrides::new().param(params::TOTAL_LENGTH, 10.0 * (i + 1) as f64),
                        )
                        .unwrap();
                });
            }
        });
    }

    fn service() -> RegionService<InMemoryConfigStore> {
        let service = RegionService::new(
            Arc::new(InMemoryConfigStore::new()),
            Arc::new(Catalog::standard()),
            &FenceConfig::default(),
        );
        assert!(service.bootstrap().unwrap());
        service
    }

    fn new_region(region_type: fencecalc_storage::RegionTypeId) -> NewRegion {
        NewRegion {
            project_id: 1,
            region_type,
            description: "north side".into(),
            nr: 1,
        }
    }

    #[test]
    fn test_bootstrap_once() {
        let service = service();
        assert!(!service.bootstrap().unwrap());
    }

    #[test]
    fn test_create_region_normalizes_defaults() {
        let service = service();
        let view = service
            .create_region(&new_region(region_types::PROFLIST_FENCE_VER))
            .unwrap();

        assert_eq!(view.params.len(), 31);
        assert_eq!(view.region_type_name, "Classic profile sheet fence, vertical");
        // painting defaults to off, which forbids the paint colors
        let paint = view.param(params::COLUMN_PAINT).unwrap();
        assert_eq!(paint.value, ParamValue::new(0.0));
        assert_eq!(paint.control.kind, ControlKind::CheckBox);
        assert_eq!(
            view.param(params::COLUMN_PAINT_COLOR).unwrap().value,
            ParamValue::UNAVAILABLE
        );
        assert_eq!(
            view.param(params::COLUMN_STEP_TYPE).unwrap().label.as_deref(),
            Some("Specified")
        );
        assert_eq!(view.parts.len(), 3);
    }

    #[test]
    fn test_horizontal_fence_has_no_rails() {
        let service = service();
        let view = service
            .create_region(&new_region(region_types::PROFLIST_FENCE_HOR))
            .unwrap();
        assert!(view.part(parts::HSTICK).is_none());
        assert!(view.part(parts::PROFILE_SHEET).is_some());
        assert!(view.param(params::PROFILE_SHEET_TYPE).is_some());
        assert!(view.param(params::HSTICK_COUNT).is_none());
    }

    #[test]
    fn test_single_project_region() {
        let service = service();
        let view = service
            .create_region(&new_region(region_types::PROJECT))
            .unwrap();
        assert!(view.params.is_empty());

        let err = service
            .create_region(&new_region(region_types::PROJECT))
            .unwrap_err();
        assert!(err.is_input());

        let mut other_project = new_region(region_types::PROJECT);
        other_project.project_id = 2;
        assert!(service.create_region(&other_project).is_ok());
    }

    #[test]
    fn test_unknown_region_type() {
        let service = service();
        let err = service
            .create_region(&new_region(fencecalc_storage::RegionTypeId(77)))
            .unwrap_err();
        assert!(err.is_input());
    }

    #[test]
    fn test_update_and_view() {
        let service = service();
        let region = service
            .create_region(&new_region(region_types::PROFLIST_FENCE_VER))
            .unwrap()
            .id;

        let view = service
            .update_region(
                region,
                &Overrides::new()
                    .param(params::COLUMN_PAINT, 1.0)
                    .param(params::COLUMN_PAINT_COLOR, 0x3f4b87 as f64),
            )
            .unwrap();
        let color = view.param(params::COLUMN_PAINT_COLOR).unwrap();
        assert_eq!(color.value, ParamValue::new(0x3f4b87 as f64));
        assert_eq!(color.control.kind, ControlKind::ColorPicker);
        assert!(color.control.enabled);

        assert_eq!(service.view_region(region).unwrap(), view);
    }

    #[test]
    fn test_part_names_in_view() {
        let service = service();
        service
            .import_nomenclature(&NomenclatureImport {
                nomenclature: vec![
                    NomenclatureRow {
                        id: NomenclatureId(100),
                        name: "Pipe 60x40x2".into(),
                        vendor_code: "P-6040-2".into(),
                    },
                    NomenclatureRow {
                        id: NomenclatureId(101),
                        name: "Pipe 60x60x2".into(),
                        vendor_code: "P-6060-2".into(),
                    },
                ],
                part_nomenclature: vec![
                    (parts::COLUMN, Some(NomenclatureId(100))),
                    (parts::COLUMN, Some(NomenclatureId(101))),
                ],
                param_nomenclature: vec![NomenclatureEdge {
                    param_type: params::COLUMN_SIZE,
                    value: ParamValue::new(2.0),
                    nomenclature: NomenclatureId(101),
                }],
            })
            .unwrap();

        let region = service
            .create_region(&new_region(region_types::PROFLIST_FENCE_VER))
            .unwrap()
            .id;
        let view = service
            .update_region(region, &Overrides::new().param(params::COLUMN_SIZE, 2.0))
            .unwrap();
        let column = view.part(parts::COLUMN).unwrap();
        assert_eq!(column.name, "Column");
        assert_eq!(column.nomenclature, Some(NomenclatureId(101)));
        assert_eq!(column.nomenclature_name.as_deref(), Some("Pipe 60x60x2"));
    }

    #[test]
    fn test_delete_region() {
        let service = service();
        let region = service
            .create_region(&new_region(region_types::GRAND_LINE))
            .unwrap()
            .id;
        assert!(service.delete_region(region).unwrap());
        assert!(!service.delete_region(region).unwrap());
        assert!(service.view_region(region).unwrap_err().is_input());
    }

    #[test]
    fn test_edits_without_serialization() {
        let config = FenceConfig {
            serialize_region_edits: false,
            ..FenceConfig::default()
        };
        let service = RegionService::new(
            Arc::new(InMemoryConfigStore::new()),
            Arc::new(Catalog::standard()),
            &config,
        );
        service.bootstrap().unwrap();
        let region = service
            .create_region(&new_region(region_types::FENCE_3D))
            .unwrap()
            .id;
        service
            .update_region(region, &Overrides::new().param(params::COLUMN_STEP_LENGTH, 3.0))
            .unwrap();
        assert!(service.locks.is_empty());
    }

    #[test]
    fn test_same_region_edits_do_not_interleave() {
        let service = RegionService::new(
            Arc::new(SlowStore::default()),
            Arc::new(Catalog::standard()),
            &FenceConfig::default(),
        );
        service.bootstrap().unwrap();
        let first = service
            .create_region(&new_region(region_types::PROFLIST_FENCE_VER))
            .unwrap()
            .id;
        let second = service
            .create_region(&new_region(region_types::PROFLIST_FENCE_VER))
            .unwrap()
            .id;
        let store = service.store();
        store.armed.store(true, Ordering::SeqCst);

        concurrent_updates(&service, &[first, first, first]);
        assert_eq!(store.max_per_region.load(Ordering::SeqCst), 1);
        assert_eq!(store.max_total.load(Ordering::SeqCst), 1);

        // different regions still proceed in parallel
        concurrent_updates(&service, &[first, second]);
        assert_eq!(store.max_per_region.load(Ordering::SeqCst), 1);
        assert_eq!(store.max_total.load(Ordering::SeqCst), 2);

        store.armed.store(false, Ordering::SeqCst);
        let total = service
            .view_region(second)
            .unwrap()
            .param(params::TOTAL_LENGTH)
            .unwrap()
            .value;
        assert_eq!(total, ParamValue::new(20.0));
    }

    #[test]
    fn test_unknown_region_leaves_no_lock_entry() {
        let service = service();
        let missing = RegionId(999);

        let err = service
            .update_region(missing, &Overrides::new().param(params::TOTAL_LENGTH, 1.0))
            .unwrap_err();
        assert!(err.is_input());
        assert!(!service.delete_region(missing).unwrap());
        assert!(service.locks.is_empty());

        let region = service
            .create_region(&new_region(region_types::PROFLIST_FENCE_VER))
            .unwrap()
            .id;
        assert!(service.locks.contains_key(&region));
    }
}

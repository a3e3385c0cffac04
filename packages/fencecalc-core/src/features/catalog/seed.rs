//! Catalog → storage rows, and catalog consistency checks

use std::collections::{BTreeSet, HashMap, HashSet};

use fencecalc_storage::{
    CatalogSeed, ComponentTypeRow, ParamEdge, ParamTypeId, ParamTypeRow, ParamValue,
    ParamValueRow, PartTypeRow, RegionTypeRow,
};

use super::model::{Catalog, ParamDecl};
use crate::shared::{FenceError, Result};

impl Catalog {
    /// Rows written to storage at bootstrap.
    ///
    /// An empty dependent list becomes a single edge to
    /// `ParamValue::UNAVAILABLE`. Edges of a color placeholder are attached
    /// to every color it expands to.
    pub fn seed(&self) -> CatalogSeed {
        let mut seed = CatalogSeed {
            region_types: self
                .region_types
                .iter()
                .map(|r| RegionTypeRow {
                    id: r.id,
                    name: r.name.clone(),
                })
                .collect(),
            component_types: self
                .components
                .iter()
                .map(|c| ComponentTypeRow {
                    id: c.id,
                    name: c.name.clone(),
                })
                .collect(),
            part_types: self
                .part_types()
                .into_iter()
                .map(|p| PartTypeRow {
                    id: p.id,
                    component_type: p.component_type,
                    name: p.name.to_string(),
                })
                .collect(),
            region_components: self
                .region_types
                .iter()
                .flat_map(|r| r.components.iter().map(move |c| (r.id, *c)))
                .collect(),
            param_parts: self.part_links.clone(),
            ..CatalogSeed::default()
        };

        for param in &self.params {
            seed.param_types.push(ParamTypeRow {
                id: param.id,
                priority: param.priority,
                name: param.name.clone(),
                description: param.description.clone(),
            });
            seed.param_regions
                .extend(param.region_types.iter().map(|r| (param.id, *r)));

            for decl in &param.values {
                let expanded = self.expand(decl);
                for (value, _) in &expanded {
                    for (dependent, allowed) in &decl.dependents {
                        let targets: Vec<ParamValue> = if allowed.is_empty() {
                            vec![ParamValue::UNAVAILABLE]
                        } else {
                            allowed.iter().map(|v| ParamValue::new(*v)).collect()
                        };
                        seed.param_edges.extend(targets.into_iter().map(|target| ParamEdge {
                            param_type: param.id,
                            value: *value,
                            dependent_type: *dependent,
                            dependent_value: target,
                        }));
                    }
                }
                seed.param_values
                    .extend(expanded.into_iter().map(|(value, label)| ParamValueRow {
                        param_type: param.id,
                        value,
                        label,
                    }));
            }
        }

        seed
    }

    /// Check ids, references and edge direction
    pub fn validate(&self) -> Result<()> {
        let mut region_ids = HashSet::new();
        for region in &self.region_types {
            if !region_ids.insert(region.id) {
                return Err(FenceError::catalog(format!(
                    "duplicate region type id {}",
                    region.id
                )));
            }
        }
        if let Some(project) = self.project_region_type {
            if !region_ids.contains(&project) {
                return Err(FenceError::catalog(format!(
                    "project region type {} is not declared",
                    project
                )));
            }
        }

        let mut component_ids = HashSet::new();
        for component in &self.components {
            if !component_ids.insert(component.id) {
                return Err(FenceError::catalog(format!(
                    "duplicate component type id {}",
                    component.id
                )));
            }
        }
        for region in &self.region_types {
            if let Some(unknown) = region.components.iter().find(|c| !component_ids.contains(c)) {
                return Err(FenceError::catalog(format!(
                    "region type {} references unknown component type {}",
                    region.id, unknown
                )));
            }
        }

        let mut params: HashMap<ParamTypeId, &ParamDecl> = HashMap::new();
        for param in &self.params {
            if params.insert(param.id, param).is_some() {
                return Err(FenceError::catalog(format!(
                    "duplicate parameter type id {}",
                    param.id
                )));
            }
            if let Some(unknown) = param.region_types.iter().find(|r| !region_ids.contains(r)) {
                return Err(FenceError::catalog(format!(
                    "parameter {} references unknown region type {}",
                    param.id, unknown
                )));
            }
            self.validate_values(param)?;
        }

        for param in &self.params {
            for decl in &param.values {
                for (dependent, allowed) in &decl.dependents {
                    let target = params.get(dependent).ok_or_else(|| {
                        FenceError::catalog(format!(
                            "parameter {} constrains unknown parameter {}",
                            param.id, dependent
                        ))
                    })?;
                    if target.priority <= param.priority {
                        return Err(FenceError::catalog(format!(
                            "edge {} -> {} never fires: priority {} is not above {}",
                            param.id, dependent, target.priority, param.priority
                        )));
                    }
                    let declared: BTreeSet<ParamValue> = self
                        .expanded_values(target)
                        .into_iter()
                        .map(|(v, _)| v)
                        .collect();
                    for value in allowed.iter().map(|v| ParamValue::new(*v)) {
                        if !value.is_unavailable() && !declared.contains(&value) {
                            return Err(FenceError::catalog(format!(
                                "edge {} -> {} allows undeclared value {}",
                                param.id, dependent, value
                            )));
                        }
                    }
                }
            }
        }

        let part_ids: HashSet<_> = self.part_types().into_iter().map(|p| p.id).collect();
        for (param, part) in &self.part_links {
            if !params.contains_key(param) {
                return Err(FenceError::catalog(format!(
                    "part link references unknown parameter {}",
                    param
                )));
            }
            if !part_ids.contains(part) {
                return Err(FenceError::catalog(format!(
                    "part link references unknown part type {}",
                    part
                )));
            }
        }

        Ok(())
    }

    fn validate_values(&self, param: &ParamDecl) -> Result<()> {
        for decl in &param.values {
            if !decl.value.is_finite() {
                return Err(FenceError::catalog(format!(
                    "parameter {} declares a non-finite value",
                    param.id
                )));
            }
            if let super::ValueKind::Color(scheme) = decl.kind {
                if scheme >= self.color_schemes.len() {
                    return Err(FenceError::catalog(format!(
                        "parameter {} references unknown color scheme {}",
                        param.id, scheme
                    )));
                }
            }
        }

        let mut seen = HashSet::new();
        for (value, _) in self.expanded_values(param) {
            if !value.is_finite() {
                return Err(FenceError::catalog(format!(
                    "parameter {} expands to a non-finite value",
                    param.id
                )));
            }
            if !seen.insert(value) {
                return Err(FenceError::catalog(format!(
                    "parameter {} declares value {} twice",
                    param.id, value
                )));
            }
        }
        Ok(())
    }
}

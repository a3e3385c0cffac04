//! Catalog declarations
//!
//! Static description of region types, parameter types with their values
//! and dependent constraints, component types with their parts, and color
//! schemes. A `Catalog` is an immutable value; it is turned into storage
//! rows by `Catalog::seed`.

use serde::Serialize;

use fencecalc_storage::{ComponentTypeId, ParamTypeId, ParamValue, PartTypeId, RegionTypeId};

/// Value of a color that means "no paint" (bare zinc coating)
pub const NO_COLOR: f64 = -1.0;

/// How a declared value is presented and expanded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ValueKind {
    /// Regular value with an optional label
    Plain(Option<String>),
    /// On/off switch; values are 0 and 1
    Bool,
    /// Placeholder expanded to every color of the scheme at this index
    Color(usize),
}

/// One declared value of a parameter type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDecl {
    pub value: f64,
    pub kind: ValueKind,
    /// Allowed values of other (later) parameters while this value is
    /// selected. An empty list makes the dependent parameter unavailable.
    pub dependents: Vec<(ParamTypeId, Vec<f64>)>,
}

impl ValueDecl {
    pub fn plain(value: f64) -> Self {
        Self {
            value,
            kind: ValueKind::Plain(None),
            dependents: Vec::new(),
        }
    }

    pub fn labeled(value: f64, label: impl Into<String>) -> Self {
        Self {
            value,
            kind: ValueKind::Plain(Some(label.into())),
            dependents: Vec::new(),
        }
    }

    pub fn boolean(value: f64) -> Self {
        Self {
            value,
            kind: ValueKind::Bool,
            dependents: Vec::new(),
        }
    }

    pub fn color(scheme: usize) -> Self {
        Self {
            value: scheme as f64,
            kind: ValueKind::Color(scheme),
            dependents: Vec::new(),
        }
    }

    /// `dependent` has no valid value while this value is selected
    pub fn forbids(mut self, dependent: ParamTypeId) -> Self {
        self.dependents.push((dependent, Vec::new()));
        self
    }

    /// `dependent` may only take `allowed` while this value is selected
    pub fn restricts(mut self, dependent: ParamTypeId, allowed: impl Into<Vec<f64>>) -> Self {
        self.dependents.push((dependent, allowed.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDecl {
    pub id: ParamTypeId,
    /// Lower resolves first
    pub priority: i32,
    pub name: String,
    pub description: String,
    /// The first value is the declaration-order default. No values means
    /// free numeric input.
    pub values: Vec<ValueDecl>,
    pub region_types: Vec<RegionTypeId>,
}

impl ParamDecl {
    pub fn new(id: ParamTypeId, priority: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            priority,
            name: name.into(),
            description: String::new(),
            values: Vec::new(),
            region_types: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn value(mut self, value: ValueDecl) -> Self {
        self.values.push(value);
        self
    }

    pub fn values(mut self, values: impl IntoIterator<Item = ValueDecl>) -> Self {
        self.values.extend(values);
        self
    }

    /// On/off parameter: 0 and 1
    pub fn switch(self) -> Self {
        self.values([ValueDecl::boolean(0.0), ValueDecl::boolean(1.0)])
    }

    pub fn regions(mut self, region_types: impl IntoIterator<Item = RegionTypeId>) -> Self {
        self.region_types.extend(region_types);
        self
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.values.first(), Some(ValueDecl { kind: ValueKind::Bool, .. }))
    }

    pub fn is_color(&self) -> bool {
        matches!(
            self.values.first(),
            Some(ValueDecl {
                kind: ValueKind::Color(_),
                ..
            })
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartDecl {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDecl {
    pub id: ComponentTypeId,
    pub name: String,
    pub parts: Vec<PartDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionTypeDecl {
    pub id: RegionTypeId,
    pub name: String,
    /// Component types instantiated for a new region, in order
    pub components: Vec<ComponentTypeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorDecl {
    /// RGB as an integer, or `NO_COLOR`
    pub value: f64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScheme {
    pub name: String,
    pub colors: Vec<ColorDecl>,
}

/// Part type as stored, with its sequential id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartTypeRef<'a> {
    pub id: PartTypeId,
    pub component_type: ComponentTypeId,
    pub name: &'a str,
}

/// Immutable catalog value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    pub region_types: Vec<RegionTypeDecl>,
    /// Region type that holds project-wide settings; at most one region of
    /// this type per project
    pub project_region_type: Option<RegionTypeId>,
    pub params: Vec<ParamDecl>,
    pub components: Vec<ComponentDecl>,
    pub color_schemes: Vec<ColorScheme>,
    /// Parameters whose value constrains a part's nomenclature
    pub part_links: Vec<(ParamTypeId, PartTypeId)>,
}

impl Catalog {
    pub fn param(&self, id: ParamTypeId) -> Option<&ParamDecl> {
        self.params.iter().find(|p| p.id == id)
    }

    pub fn region_type(&self, id: RegionTypeId) -> Option<&RegionTypeDecl> {
        self.region_types.iter().find(|r| r.id == id)
    }

    /// Part types with ids assigned sequentially from 1 in component order
    pub fn part_types(&self) -> Vec<PartTypeRef<'_>> {
        self.components
            .iter()
            .flat_map(|c| c.parts.iter().map(move |p| (c.id, p.name.as_str())))
            .enumerate()
            .map(|(i, (component_type, name))| PartTypeRef {
                id: PartTypeId(i as i64 + 1),
                component_type,
                name,
            })
            .collect()
    }

    pub fn part_type(&self, id: PartTypeId) -> Option<PartTypeRef<'_>> {
        self.part_types().into_iter().find(|p| p.id == id)
    }

    /// Stored values of a parameter with their labels, in declaration order.
    ///
    /// Color placeholders expand to every color of their scheme. Unknown
    /// schemes expand to nothing.
    pub fn expanded_values(&self, param: &ParamDecl) -> Vec<(ParamValue, String)> {
        param
            .values
            .iter()
            .flat_map(|decl| self.expand(decl))
            .collect()
    }

    /// Stored values produced by one declared value
    pub(crate) fn expand(&self, decl: &ValueDecl) -> Vec<(ParamValue, String)> {
        match &decl.kind {
            ValueKind::Plain(label) => vec![(
                ParamValue::new(decl.value),
                label.clone().unwrap_or_default(),
            )],
            ValueKind::Bool => {
                let label = if decl.value == 0.0 { "no" } else { "yes" };
                vec![(ParamValue::new(decl.value), label.to_string())]
            }
            ValueKind::Color(scheme) => self
                .color_schemes
                .get(*scheme)
                .map(|scheme| {
                    scheme
                        .colors
                        .iter()
                        .map(|c| (ParamValue::new(c.value), c.name.clone()))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

//! Standard fence catalog

use fencecalc_storage::{ComponentTypeId, ParamTypeId, PartTypeId, RegionTypeId};

use super::model::{
    Catalog, ColorDecl, ColorScheme, ComponentDecl, ParamDecl, PartDecl, RegionTypeDecl,
    ValueDecl, NO_COLOR,
};

/// Region type ids
pub mod region_types {
    use super::RegionTypeId;

    pub const PROJECT: RegionTypeId = RegionTypeId(0);
    pub const PROFLIST_FENCE_VER: RegionTypeId = RegionTypeId(1);
    pub const PROFLIST_FENCE_HOR: RegionTypeId = RegionTypeId(2);
    pub const BATTEN_FENCE_VER: RegionTypeId = RegionTypeId(3);
    pub const BATTEN_FENCE_HOR: RegionTypeId = RegionTypeId(4);
    pub const KNX_PROFLIST_FENCE: RegionTypeId = RegionTypeId(5);
    pub const KNX_BATTEN_FENCE: RegionTypeId = RegionTypeId(6);
    pub const KNX_ECO_PROFLIST_FENCE: RegionTypeId = RegionTypeId(7);
    pub const KNX_ECO_BATTEN_FENCE: RegionTypeId = RegionTypeId(8);
    pub const FENCE_2D: RegionTypeId = RegionTypeId(9);
    pub const FENCE_3D: RegionTypeId = RegionTypeId(10);
    pub const GRAND_LINE: RegionTypeId = RegionTypeId(11);
}

/// Parameter type ids
pub mod params {
    use super::ParamTypeId;

    pub const TOTAL_LENGTH: ParamTypeId = ParamTypeId(0);
    pub const TOTAL_HEIGHT: ParamTypeId = ParamTypeId(1);
    pub const BOTTOM_SPACE: ParamTypeId = ParamTypeId(2);
    pub const UP_SPACE: ParamTypeId = ParamTypeId(3);
    pub const COLUMN_DEPTH: ParamTypeId = ParamTypeId(4);
    pub const COLUMN_STEP_LENGTH: ParamTypeId = ParamTypeId(5);
    pub const COLUMN_STEP_TYPE: ParamTypeId = ParamTypeId(6);
    pub const COLUMN_STEP_SPACE: ParamTypeId = ParamTypeId(7);
    pub const COLUMN_INSTALL_METHOD: ParamTypeId = ParamTypeId(8);
    pub const COLUMN_SIZE: ParamTypeId = ParamTypeId(9);
    pub const INSTALL_COLUMNS: ParamTypeId = ParamTypeId(10);
    pub const COLUMN_PAINT: ParamTypeId = ParamTypeId(11);
    pub const COLUMN_COVER: ParamTypeId = ParamTypeId(12);
    pub const COLUMN_PAINT_COLOR: ParamTypeId = ParamTypeId(13);
    pub const COLUMN_BRACKETS: ParamTypeId = ParamTypeId(14);
    pub const PROFILE_SHEET_THICKNESS: ParamTypeId = ParamTypeId(15);
    pub const PROFILE_SHEET_TYPE: ParamTypeId = ParamTypeId(16);
    pub const INSTALL_CANVAS: ParamTypeId = ParamTypeId(17);
    pub const CANVAS_PAINT: ParamTypeId = ParamTypeId(18);
    pub const CANVAS_COLOR: ParamTypeId = ParamTypeId(19);
    pub const CANVAS_PAINT_COLOR: ParamTypeId = ParamTypeId(20);
    pub const FIX_COLOR: ParamTypeId = ParamTypeId(21);
    pub const FIX: ParamTypeId = ParamTypeId(22);
    pub const HSTICK_COUNT: ParamTypeId = ParamTypeId(23);
    pub const HSTICK_BOTTOM_SPACE: ParamTypeId = ParamTypeId(24);
    pub const HSTICK_UP_SPACE: ParamTypeId = ParamTypeId(25);
    pub const HSTICK_LENGTH: ParamTypeId = ParamTypeId(26);
    pub const HSTICK_SIZE: ParamTypeId = ParamTypeId(27);
    pub const INSTALL_HSTICK: ParamTypeId = ParamTypeId(28);
    pub const HSTICK_COLOR: ParamTypeId = ParamTypeId(29);
    pub const HSTICK_PAINT: ParamTypeId = ParamTypeId(30);
}

/// Component type ids
pub mod components {
    use super::ComponentTypeId;

    pub const COLUMNS: ComponentTypeId = ComponentTypeId(0);
    pub const HSTICKS: ComponentTypeId = ComponentTypeId(1);
    pub const FILLING: ComponentTypeId = ComponentTypeId(2);
}

/// Part type ids (sequential in component order)
pub mod parts {
    use super::PartTypeId;

    pub const COLUMN: PartTypeId = PartTypeId(1);
    pub const HSTICK: PartTypeId = PartTypeId(2);
    pub const PROFILE_SHEET: PartTypeId = PartTypeId(3);
}

/// Column step split
pub const STEP_SPECIFIED: f64 = 0.0;
pub const STEP_EQUABLE: f64 = 1.0;

/// Index of the RAL scheme in `Catalog::color_schemes`
pub const RAL: usize = 0;

// Priority bands
const BASE: i32 = 0;
const SWITCH: i32 = 1;
const COLOR: i32 = 2;

impl Catalog {
    /// Fence catalog with every region type, parameter and component in use
    pub fn standard() -> Self {
        use params::*;
        use region_types::*;

        let fences = [
            PROFLIST_FENCE_VER,
            PROFLIST_FENCE_HOR,
            BATTEN_FENCE_VER,
            BATTEN_FENCE_HOR,
            KNX_PROFLIST_FENCE,
            KNX_BATTEN_FENCE,
            KNX_ECO_PROFLIST_FENCE,
            KNX_ECO_BATTEN_FENCE,
            FENCE_2D,
            FENCE_3D,
            GRAND_LINE,
        ];
        let proflist = [PROFLIST_FENCE_VER, PROFLIST_FENCE_HOR];
        let vertical = [PROFLIST_FENCE_VER];

        let params = vec![
            ParamDecl::new(TOTAL_LENGTH, BASE, "Region length, m").regions(fences),
            ParamDecl::new(TOTAL_HEIGHT, BASE, "Fence height, m").regions(fences),
            ParamDecl::new(BOTTOM_SPACE, BASE, "Bottom gap, mm").regions(fences),
            ParamDecl::new(UP_SPACE, BASE, "Column overhang above canvas, mm").regions(fences),
            // TODO: confirm the default burial depth with installers
            ParamDecl::new(COLUMN_DEPTH, BASE, "Column burial depth, mm")
                .value(ValueDecl::plain(1.0))
                .regions(fences),
            ParamDecl::new(COLUMN_STEP_LENGTH, BASE, "Column step, m")
                .values([ValueDecl::plain(2.0), ValueDecl::plain(3.0)])
                .regions(fences),
            ParamDecl::new(COLUMN_STEP_TYPE, BASE, "Column step split")
                .values([
                    ValueDecl::labeled(STEP_SPECIFIED, "Specified"),
                    ValueDecl::labeled(STEP_EQUABLE, "Split into equal spans")
                        .forbids(COLUMN_STEP_SPACE),
                ])
                .regions(fences),
            ParamDecl::new(COLUMN_STEP_SPACE, SWITCH, "Column step remainder")
                .values([
                    ValueDecl::labeled(0.0, "Remainder at the end"),
                    ValueDecl::labeled(1.0, "Remainder at the start"),
                ])
                .regions(fences),
            ParamDecl::new(COLUMN_INSTALL_METHOD, BASE, "Column installation method")
                .values([
                    ValueDecl::labeled(0.0, "Concreting"),
                    ValueDecl::labeled(1.0, "Rubble backfill"),
                    ValueDecl::labeled(2.0, "HILST"),
                    ValueDecl::labeled(3.0, "Flanges"),
                ])
                .regions(fences),
            ParamDecl::new(COLUMN_SIZE, BASE, "Materials")
                .description("Column size")
                .values([
                    ValueDecl::labeled(0.0, "60x40x2"),
                    ValueDecl::labeled(1.0, "60x40x3"),
                    ValueDecl::labeled(2.0, "60x60x2"),
                    ValueDecl::labeled(3.0, "60x60x3"),
                    ValueDecl::labeled(4.0, "80x80x3"),
                    ValueDecl::labeled(5.0, "100x100x5"),
                ])
                .regions(fences),
            ParamDecl::new(INSTALL_COLUMNS, BASE, "Installation")
                .description("Column installation")
                .switch()
                .regions(vertical),
            ParamDecl::new(COLUMN_PAINT, SWITCH, "Painting")
                .description("Column painting")
                .values([
                    ValueDecl::boolean(0.0).forbids(COLUMN_PAINT_COLOR),
                    ValueDecl::boolean(1.0),
                ])
                .regions(vertical),
            ParamDecl::new(COLUMN_COVER, BASE, "Caps")
                .description("Column caps")
                .switch()
                .regions(vertical),
            ParamDecl::new(COLUMN_PAINT_COLOR, COLOR, "Color")
                .description("Column paint color")
                .value(ValueDecl::color(RAL))
                .regions(vertical),
            ParamDecl::new(COLUMN_BRACKETS, BASE, "Brackets")
                .description("Brackets on columns")
                .switch()
                .regions(vertical),
            ParamDecl::new(PROFILE_SHEET_THICKNESS, BASE, "Profile sheet thickness, mm")
                .values(
                    [0.4, 0.45, 0.5, 0.55, 0.6, 0.65, 0.7]
                        .into_iter()
                        .map(ValueDecl::plain),
                )
                .regions(proflist),
            ParamDecl::new(PROFILE_SHEET_TYPE, BASE, "Type")
                .description("Profile sheet type")
                .values([
                    ValueDecl::labeled(0.0, "SSm 10"),
                    ValueDecl::labeled(1.0, "S10 M1"),
                    ValueDecl::labeled(2.0, "Mp20"),
                    ValueDecl::labeled(3.0, "S21"),
                    ValueDecl::labeled(4.0, "S44"),
                ])
                .regions(proflist),
            ParamDecl::new(INSTALL_CANVAS, BASE, "Installation")
                .description("Canvas installation")
                .switch()
                .regions(vertical),
            ParamDecl::new(CANVAS_PAINT, SWITCH, "Painting")
                .description("Canvas painting")
                .values([
                    ValueDecl::boolean(0.0).forbids(CANVAS_PAINT_COLOR),
                    ValueDecl::boolean(1.0).restricts(CANVAS_COLOR, [NO_COLOR]),
                ])
                .regions(vertical),
            ParamDecl::new(CANVAS_COLOR, COLOR, "Color")
                .description("Canvas color")
                .value(ValueDecl::color(RAL))
                .regions(vertical),
            ParamDecl::new(CANVAS_PAINT_COLOR, COLOR, "Color")
                .description("Canvas paint color")
                .value(ValueDecl::color(RAL))
                .regions(vertical),
            ParamDecl::new(FIX_COLOR, COLOR, "Color")
                .description("Fastener color")
                .value(ValueDecl::color(RAL))
                .regions(vertical),
            ParamDecl::new(FIX, SWITCH, "Fasteners")
                .description("Canvas fasteners")
                .values([
                    ValueDecl::boolean(0.0).forbids(FIX_COLOR),
                    ValueDecl::boolean(1.0),
                ])
                .regions(vertical),
            ParamDecl::new(HSTICK_COUNT, BASE, "Count")
                .description("Rail count")
                .values([ValueDecl::plain(2.0), ValueDecl::plain(3.0)])
                .regions(vertical),
            ParamDecl::new(HSTICK_BOTTOM_SPACE, BASE, "Bottom rail above sheet bottom, mm")
                .value(ValueDecl::plain(300.0))
                .regions(vertical),
            ParamDecl::new(HSTICK_UP_SPACE, BASE, "Top rail below column top, mm")
                .value(ValueDecl::plain(250.0))
                .regions(vertical),
            ParamDecl::new(HSTICK_LENGTH, BASE, "Length, m")
                .description("Rail length, m")
                .values([2.0, 3.0, 4.0, 6.0].into_iter().map(ValueDecl::plain))
                .regions(vertical),
            ParamDecl::new(HSTICK_SIZE, BASE, "Materials")
                .description("Rail size")
                .values([
                    ValueDecl::labeled(0.0, "40x20x1.5"),
                    ValueDecl::labeled(1.0, "40x40x2"),
                ])
                .regions(vertical),
            ParamDecl::new(INSTALL_HSTICK, BASE, "Installation")
                .description("Rail installation")
                .switch()
                .regions(vertical),
            ParamDecl::new(HSTICK_COLOR, COLOR, "Color")
                .description("Rail color")
                .value(ValueDecl::color(RAL))
                .regions(vertical),
            ParamDecl::new(HSTICK_PAINT, SWITCH, "Painting")
                .description("Rail painting")
                .values([
                    ValueDecl::boolean(0.0).forbids(HSTICK_COLOR),
                    ValueDecl::boolean(1.0),
                ])
                .regions(vertical),
        ];

        let full = vec![
            components::COLUMNS,
            components::HSTICKS,
            components::FILLING,
        ];
        let without_rails = vec![components::COLUMNS, components::FILLING];
        let region = |id: RegionTypeId, name: &str, components: Vec<ComponentTypeId>| {
            RegionTypeDecl {
                id,
                name: name.to_string(),
                components,
            }
        };
        let region_types = vec![
            region(PROJECT, "Project", Vec::new()),
            region(
                PROFLIST_FENCE_VER,
                "Classic profile sheet fence, vertical",
                full.clone(),
            ),
            region(
                PROFLIST_FENCE_HOR,
                "Classic profile sheet fence, horizontal",
                without_rails.clone(),
            ),
            region(BATTEN_FENCE_VER, "Classic picket fence, vertical", full.clone()),
            region(
                BATTEN_FENCE_HOR,
                "Classic picket fence, horizontal",
                without_rails,
            ),
            region(KNX_PROFLIST_FENCE, "KNX profile sheet fence", full.clone()),
            region(KNX_BATTEN_FENCE, "KNX picket fence", full.clone()),
            region(
                KNX_ECO_PROFLIST_FENCE,
                "KNX ECO profile sheet fence",
                full.clone(),
            ),
            region(KNX_ECO_BATTEN_FENCE, "KNX ECO picket fence", full.clone()),
            region(FENCE_2D, "2D welded panel fence", full.clone()),
            region(FENCE_3D, "3D welded panel fence", full.clone()),
            region(GRAND_LINE, "Grand Line modular fence", full),
        ];

        let part = |name: &str| PartDecl {
            name: name.to_string(),
        };
        let component_decls = vec![
            ComponentDecl {
                id: components::COLUMNS,
                name: "Columns".to_string(),
                parts: vec![part("Column")],
            },
            ComponentDecl {
                id: components::HSTICKS,
                name: "Rails".to_string(),
                parts: vec![part("Rail")],
            },
            ComponentDecl {
                id: components::FILLING,
                name: "Filling".to_string(),
                parts: vec![part("Profile sheet")],
            },
        ];

        Catalog {
            region_types,
            project_region_type: Some(PROJECT),
            params,
            components: component_decls,
            color_schemes: vec![ral_scheme()],
            part_links: vec![
                (COLUMN_SIZE, parts::COLUMN),
                (HSTICK_SIZE, parts::HSTICK),
                (PROFILE_SHEET_TYPE, parts::PROFILE_SHEET),
            ],
        }
    }
}

fn ral_scheme() -> ColorScheme {
    let color = |value: f64, name: &str| ColorDecl {
        value,
        name: name.to_string(),
    };
    ColorScheme {
        name: "RAL".to_string(),
        colors: vec![
            color(NO_COLOR, "Zinc"),
            color(0xdcc6a1 as f64, "RAL1014 (ivory)"),
            color(0xe5d5bb as f64, "RAL1015 (light ivory)"),
            color(0x8d764c as f64, "RAL1036 (pearl gold)"),
            color(0xdf5e34 as f64, "RAL2004 (pure orange)"),
            color(0x8a383e as f64, "RAL3003 (ruby red)"),
            color(0x663d43 as f64, "RAL3005 (wine red)"),
            color(0x7d3d3d as f64, "RAL3011 (brown red)"),
            color(0xbb3939 as f64, "RAL3020 (traffic red)"),
            color(0x3f4b87 as f64, "RAL5002 (ultramarine blue)"),
            color(0x2b5d8e as f64, "RAL5005 (signal blue)"),
            color(0x097d7d as f64, "RAL5021 (water blue)"),
            color(0x456540 as f64, "RAL6002 (leaf green)"),
            color(0x365148 as f64, "RAL6005 (moss green)"),
            color(0x07695a as f64, "RAL6026 (opal green)"),
            color(0x00784b as f64, "RAL6029 (mint green)"),
            color(0xa0a0a0 as f64, "RAL7004 (signal grey)"),
            color(0x534542 as f64, "RAL8017 (chocolate brown)"),
            color(0x7b3e25 as f64, "RAL8029 (pearl copper)"),
            color(0xd8d8d0 as f64, "RAL9002 (grey white)"),
            color(0xeeeeec as f64, "RAL9003 (signal white)"),
            color(0x6c4e3c as f64, "Printech \"Wood\" 4201"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_shape() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.params.len(), 31);
        assert_eq!(catalog.region_types.len(), 12);
        assert_eq!(catalog.components.len(), 3);

        for (i, param) in catalog.params.iter().enumerate() {
            assert_eq!(param.id, ParamTypeId(i as i64), "{}", param.name);
            assert!(!param.region_types.is_empty(), "{}", param.name);
        }
    }

    #[test]
    fn test_standard_catalog_is_valid() {
        Catalog::standard().validate().unwrap();
    }

    #[test]
    fn test_part_type_ids() {
        let catalog = Catalog::standard();
        let refs = catalog.part_types();
        let ids: Vec<(PartTypeId, ComponentTypeId)> =
            refs.iter().map(|p| (p.id, p.component_type)).collect();
        assert_eq!(
            ids,
            vec![
                (parts::COLUMN, components::COLUMNS),
                (parts::HSTICK, components::HSTICKS),
                (parts::PROFILE_SHEET, components::FILLING),
            ]
        );
    }

    #[test]
    fn test_color_params_expand_to_scheme() {
        let catalog = Catalog::standard();
        let param = catalog.param(params::CANVAS_COLOR).unwrap();
        let values = catalog.expanded_values(param);
        assert_eq!(values.len(), 22);
        assert_eq!(values[0].0.get(), NO_COLOR);
        assert_eq!(values[0].1, "Zinc");
        assert_eq!(values[1].0.get(), 0xdcc6a1 as f64);
    }

    #[test]
    fn test_switch_labels() {
        let catalog = Catalog::standard();
        let param = catalog.param(params::FIX).unwrap();
        assert!(param.is_bool());
        let labels: Vec<String> = catalog
            .expanded_values(param)
            .into_iter()
            .map(|(_, l)| l)
            .collect();
        assert_eq!(labels, vec!["no", "yes"]);
    }
}
